use crate::{
    api::leave,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Auth routes; register still requires an admin token inside the handler
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Leave workflow, token required before any handler runs
    cfg.service(
        web::scope("/leaves")
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            // /leaves
            .service(web::resource("").route(web::post().to(leave::create_leave)))
            // /leaves/my-leaves
            .service(web::resource("/my-leaves").route(web::get().to(leave::my_leaves)))
            // /leaves/all
            .service(web::resource("/all").route(web::get().to(leave::all_leaves)))
            // /leaves/{id}/status
            .service(
                web::resource("/{id}/status").route(web::put().to(leave::update_leave_status)),
            ),
    );
}
