//! Demo data for local development and the black-box suite.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::info;

use juris_auth::{Role, TenantScope, hash_password};
use juris_records::{
    Case, Client, ClientKind, Firm, Money, NewCase, NewClient, NewFirm, NewUser, User,
};

use crate::Store;

pub const DEMO_ADMIN_EMAIL: &str = "admin@escritorio.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_LAWYER_EMAIL: &str = "joao@escritorio.com";
pub const DEMO_LAWYER_PASSWORD: &str = "advogado123";

/// Create the demo firm with an admin, a lawyer, a client and one active
/// case. Does nothing when the demo admin already exists.
///
/// Returns whether anything was written.
pub async fn seed_demo_data(store: &dyn Store) -> anyhow::Result<bool> {
    if store
        .find_principal_by_email(DEMO_ADMIN_EMAIL)
        .await
        .context("looking up demo admin")?
        .is_some()
    {
        info!("demo data already present");
        return Ok(false);
    }

    let now = Utc::now();
    let firm = Firm::create(
        NewFirm {
            name: "Escritório Modelo Advocacia".into(),
            cnpj: Some("12.345.678/0001-90".into()),
            email: Some("contato@escritoriomodelo.com".into()),
            phone: Some("(11) 99999-9999".into()),
        },
        now,
    );
    let scope = TenantScope::for_new_firm(firm.id);

    let admin = User::create(
        &scope,
        NewUser {
            name: "Administrador".into(),
            email: DEMO_ADMIN_EMAIL.into(),
            password: DEMO_ADMIN_PASSWORD.into(),
            role: Role::Admin,
            is_active: true,
        },
        now,
    );
    let admin_hash = hash_password(DEMO_ADMIN_PASSWORD)?;
    let (firm, _admin) = store
        .create_firm_with_admin(firm, admin, admin_hash)
        .await
        .context("creating demo firm")?;

    let lawyer = User::create(
        &scope,
        NewUser {
            name: "Dr. João Advogado".into(),
            email: DEMO_LAWYER_EMAIL.into(),
            password: DEMO_LAWYER_PASSWORD.into(),
            role: Role::Lawyer,
            is_active: true,
        },
        now,
    );
    let lawyer = store
        .create_user(&scope, lawyer, hash_password(DEMO_LAWYER_PASSWORD)?)
        .await
        .context("creating demo lawyer")?;

    let client = store
        .create_client(
            &scope,
            Client::create(
                &scope,
                NewClient {
                    kind: ClientKind::Pf,
                    name: "Maria Silva".into(),
                    document: Some("123.456.789-00".into()),
                    email: Some("maria@email.com".into()),
                    phone: Some("(11) 98888-7777".into()),
                    address: Some("Rua Exemplo, 123 - São Paulo/SP".into()),
                    state: Some("SP".into()),
                },
                now,
            ),
        )
        .await
        .context("creating demo client")?;

    store
        .create_case(
            &scope,
            Case::create(
                &scope,
                NewCase {
                    client_id: client.id,
                    case_number: Some("1234567-89.2023.8.26.0000".into()),
                    court: Some("1ª Vara Cível".into()),
                    area: Some("cível".into()),
                    status: Some("em andamento".into()),
                    distribution_date: NaiveDate::from_ymd_opt(2023, 1, 15),
                    value: Some(Money::from_cents(5_000_000)),
                    description: Some("Ação de cobrança".into()),
                    responsible_lawyer_id: Some(lawyer.id),
                },
                now,
            ),
        )
        .await
        .context("creating demo case")?;

    info!(firm_id = %firm.id, "demo data seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use juris_auth::PrincipalDirectory;
    use juris_core::Page;
    use juris_records::{CaseFilter, ClientFilter};

    use super::*;
    use crate::{CaseStore, ClientStore, MemoryStore, UserStore};

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        assert!(seed_demo_data(&store).await.unwrap());
        assert!(!seed_demo_data(&store).await.unwrap());

        let admin = store
            .find_principal_by_email(DEMO_ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.principal.role, Role::Admin);
        assert!(juris_auth::verify_password(DEMO_ADMIN_PASSWORD, &admin.password_hash));

        let scope = TenantScope::of(&admin.principal);
        assert_eq!(store.list_users(&scope, Page::default()).await.unwrap().len(), 2);
        let clients = store
            .list_clients(&scope, &ClientFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(clients.len(), 1);
        let cases = store
            .list_cases(&scope, &CaseFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(cases.len(), 1);
        assert!(cases[0].is_active());
        assert_eq!(cases[0].value, Some(Money::from_cents(5_000_000)));
    }
}
