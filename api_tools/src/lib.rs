use actix_web::web::{self};

pub mod routes {
    pub mod tools;
    pub mod usage;
}

pub mod services {
    pub mod launch;
    pub mod pricing;
    pub mod usage;
}

pub mod dtos {
    pub mod tools;
}

pub mod models {
    pub mod launch;
    pub mod tool;
}

pub fn mount_tools() -> actix_web::Scope {
    web::scope("/tools")
        .service(routes::tools::post_pricing)
        .service(routes::tools::get_launch_plan)
        .service(routes::tools::put_launch_task)
}

pub fn mount_usage() -> actix_web::Scope {
    web::scope("/usage")
        .service(routes::usage::get_stats)
        .service(routes::usage::get_gate)
        .service(routes::usage::post_usage)
}
