// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{GrantRepository, OrgUnitRepository, RoleRepository, UserRepository},
    db::{GrantStore, OrgUnitDirectory, RoleCatalog, UserStore},
    services::{ApprovalService, AuthService, GrantService, UserService},
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_operation_timeout: Duration,
    pub admin_role_name: String,
    // E-mail do primeiro administrador, promovido na inicialização
    pub bootstrap_admin_email: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => v.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            Err(_) => 5,
        };

        let timeout_ms: u64 = match env::var("DB_OPERATION_TIMEOUT_MS") {
            Ok(v) => v.parse().context("DB_OPERATION_TIMEOUT_MS deve ser um número")?,
            Err(_) => 5000,
        };

        let admin_role_name = env::var("ADMIN_ROLE_NAME").unwrap_or_else(|_| "admin".to_string());
        let bootstrap_admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .filter(|email| !email.trim().is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            db_operation_timeout: Duration::from_millis(timeout_ms),
            admin_role_name,
            bootstrap_admin_email,
        })
    }
}

// As portas de persistência, já como objetos de trait
#[derive(Clone)]
pub struct Ports {
    pub grants: Arc<dyn GrantStore>,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleCatalog>,
    pub org_units: Arc<dyn OrgUnitDirectory>,
}

impl Ports {
    pub fn postgres(pool: &PgPool, timeout: Duration) -> Self {
        Self {
            grants: Arc::new(GrantRepository::new(pool.clone(), timeout)),
            users: Arc::new(UserRepository::new(pool.clone(), timeout)),
            roles: Arc::new(RoleRepository::new(pool.clone(), timeout)),
            org_units: Arc::new(OrgUnitRepository::new(pool.clone(), timeout)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub approval_service: ApprovalService,
    pub grant_service: GrantService,
    pub user_service: UserService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // Faz o app rodar as migrações do SQLx na inicialização
        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        let ports = Ports::postgres(&db_pool, settings.db_operation_timeout);
        let app_state = Self::from_ports(settings, ports);

        // Sem isso um banco novo não tem quem administre
        if let Some(email) = app_state.settings.bootstrap_admin_email.as_deref() {
            app_state
                .approval_service
                .bootstrap_admin(email, &app_state.settings.admin_role_name)
                .await
                .context("Falha ao promover o administrador inicial")?;
        }

        Ok(app_state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_ports(settings: Settings, ports: Ports) -> Self {
        let auth_service = AuthService::new(settings.jwt_secret.clone());
        let approval_service = ApprovalService::new(
            ports.grants.clone(),
            ports.users.clone(),
            ports.roles.clone(),
        );
        let grant_service = GrantService::new(
            ports.grants.clone(),
            ports.users.clone(),
            ports.roles.clone(),
            ports.org_units.clone(),
        );
        let user_service = UserService::new(ports.grants, ports.users, ports.roles, ports.org_units);

        Self {
            settings: Arc::new(settings),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            approval_service,
            grant_service,
            user_service,
        }
    }
}
