// src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas públicas do cliente final (entrar na fila e acompanhar posição)
    let public_routes = Router::new()
        .route("/queues/{id}/join", post(handlers::queues::join_queue))
        .route("/queues/{id}/status", get(handlers::queues::queue_status))
        .route(
            "/entries/{id}/position",
            get(handlers::queues::entry_position),
        );

    // Rotas de usuário (protegidas)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Locais e catálogo de serviços
    let location_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_location).get(handlers::tenancy::list_locations),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let service_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_service).get(handlers::tenancy::list_services),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Filas (staff)
    let queue_routes = Router::new()
        .route(
            "/",
            post(handlers::queues::create_queue).get(handlers::queues::list_queues),
        )
        .route(
            "/{id}",
            get(handlers::queues::get_queue)
                .patch(handlers::queues::update_queue)
                .delete(handlers::queues::deactivate_queue),
        )
        .route("/{id}/entries", get(handlers::queues::list_entries))
        .route("/{id}/call-next", post(handlers::queues::call_next))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Entradas (staff)
    let entry_routes = Router::new()
        .route("/{id}/serve", post(handlers::queues::serve_entry))
        .route("/{id}/cancel", post(handlers::queues::cancel_entry))
        .route("/{id}/no-show", post(handlers::queues::no_show_entry))
        .route("/{id}/remind", post(handlers::queues::remind_entry))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Assinatura / quota de SMS
    let subscription_routes = Router::new()
        .route("/sms-quota", get(handlers::subscriptions::sms_quota))
        .route("/renew", post(handlers::subscriptions::renew_subscription))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/public", public_routes)
        .nest("/api/users", user_routes)
        .nest("/api/locations", location_routes)
        .nest("/api/services", service_routes)
        .nest("/api/queues", queue_routes)
        .nest("/api/entries", entry_routes)
        .nest("/api/subscriptions", subscription_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
