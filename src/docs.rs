// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_location,
        handlers::tenancy::list_locations,
        handlers::tenancy::create_service,
        handlers::tenancy::list_services,

        // --- Queues ---
        handlers::queues::create_queue,
        handlers::queues::list_queues,
        handlers::queues::get_queue,
        handlers::queues::update_queue,
        handlers::queues::deactivate_queue,
        handlers::queues::list_entries,
        handlers::queues::call_next,

        // --- Entries ---
        handlers::queues::serve_entry,
        handlers::queues::cancel_entry,
        handlers::queues::no_show_entry,
        handlers::queues::remind_entry,

        // --- Public ---
        handlers::queues::join_queue,
        handlers::queues::queue_status,
        handlers::queues::entry_position,

        // --- Subscriptions ---
        handlers::subscriptions::sms_quota,
        handlers::subscriptions::renew_subscription,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Organization,
            models::tenancy::Location,
            models::tenancy::Service,
            models::tenancy::CreateLocationPayload,
            models::tenancy::CreateServicePayload,

            // --- Queues ---
            models::queue::EntryStatus,
            models::queue::Queue,
            models::queue::QueueEntry,
            models::queue::CreateQueuePayload,
            models::queue::UpdateQueuePayload,
            models::queue::JoinQueuePayload,
            models::queue::EntryActionResponse,
            models::queue::QueueStatusResponse,
            models::queue::EntryPositionResponse,

            // --- Notifications ---
            models::notification::NotifiedVia,
            models::notification::DeliveryResult,
            models::notification::NotificationReport,

            // --- Subscriptions ---
            models::subscription::PlanType,
            models::subscription::SubscriptionStatus,
            models::subscription::Subscription,
            models::subscription::QuotaStatus,
        )
    ),
    tags(
        (name = "Health", description = "Disponibilidade do serviço"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Tenancy", description = "Locais e Catálogo de Serviços"),
        (name = "Queues", description = "Gestão de Filas"),
        (name = "Entries", description = "Ciclo de Vida das Entradas"),
        (name = "Public", description = "Rotas Públicas do Cliente Final"),
        (name = "Subscriptions", description = "Planos e Quota de SMS")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
