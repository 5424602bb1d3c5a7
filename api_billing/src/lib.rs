use actix_web::web::{self};

pub mod routes {
    pub mod billing;
    pub mod webhook;
}

pub mod services {
    pub mod provider;
    pub mod signature;
    pub(crate) mod checkout;
    pub(crate) mod paddle;
    pub(crate) mod stripe;
    pub(crate) mod sub;
    pub(crate) mod webhook;
}

pub mod dtos {
    pub mod billing;
}

mod models {
    pub(crate) mod paddle;
    pub(crate) mod stripe;
}

pub use services::provider::{BillingProvider, CheckoutParams, ProviderClients};

pub fn mount_webhooks() -> actix_web::Scope {
    web::scope("/webhooks")
        .service(routes::webhook::post_paddle_webhook)
        .service(routes::webhook::post_stripe_webhook)
}

pub fn mount_billing() -> actix_web::Scope {
    web::scope("/billing")
        .service(routes::billing::get_subscription)
        .service(routes::billing::post_cancel)
        .service(routes::billing::post_stripe_checkout)
        .service(routes::billing::post_paddle_checkout)
}
