use std::sync::Arc;

use clap::Parser;
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;

use healthtrack_backend::api::{AdminApi, AuthApi, GithubAuthApi, HealthApi, ThresholdApi, WechatAuthApi};
use healthtrack_backend::app_data::AppData;
use healthtrack_backend::cli::{self, Cli, Commands};
use healthtrack_backend::config::{
    BootstrapSettings, EnvironmentProvider, LoggingConfig, SystemEnvironment, init_database, init_logging,
    migrate_database,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let env_provider: Arc<dyn EnvironmentProvider> = Arc::new(SystemEnvironment);
    init_logging(&LoggingConfig::from_env_provider(env_provider.as_ref()))?;

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);
    let settings = BootstrapSettings::from_env_provider(env_provider.clone())?;
    tracing::debug!("Loaded settings: {:?}", settings);

    if command == Commands::Migrate {
        return cli::migrate::run_migrations(&settings).await;
    }

    let db = init_database(&settings).await?;
    migrate_database(&db).await?;

    let app_data = Arc::new(AppData::init(db, &settings, env_provider).await?);

    match command {
        Commands::Serve => serve(app_data, &settings).await?,
        other => cli::execute_command(other, &app_data).await?,
    }

    Ok(())
}

async fn serve(app_data: Arc<AppData>, settings: &BootstrapSettings) -> Result<(), std::io::Error> {
    let apis = (
        HealthApi::new(app_data.db.clone()),
        AuthApi::new(app_data.auth_service.clone()),
        GithubAuthApi::new(app_data.github_auth_service.clone(), settings.frontend_url().to_string()),
        WechatAuthApi::new(app_data.wechat_auth_service.clone()),
        AdminApi::new(app_data.admin_service.clone(), app_data.auth_service.clone()),
        ThresholdApi::new(app_data.threshold_service.clone(), app_data.auth_service.clone()),
    );

    let server_url = format!("http://{}/api", settings.server_address());
    let api_service = OpenApiService::new(apis, "HealthTrack API", env!("CARGO_PKG_VERSION")).server(server_url);
    let ui = api_service.swagger_ui();

    // Compose routes: nest API service under /api and Swagger UI under /swagger
    let app = Route::new().nest("/api", api_service).nest("/swagger", ui);

    tracing::info!("Starting server on http://{}", settings.server_address());
    tracing::info!("Swagger UI available at http://{}/swagger", settings.server_address());

    Server::new(TcpListener::bind(settings.server_address())).run(app).await
}
