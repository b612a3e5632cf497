use crate::{
    api::{attendance, dashboard, members, reports, settings},
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
        let burst = requests_per_min.max(1);
        let per_ms = (60_000 / burst as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("non-zero period and burst always build");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
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
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/settings")
                    // /settings
                    .service(
                        web::resource("")
                            .route(web::get().to(settings::get_settings))
                            .route(web::put().to(settings::save_settings)),
                    )
                    .service(web::resource("/open").route(web::post().to(settings::open_today)))
                    .service(
                        web::resource("/close").route(web::post().to(settings::close_attendance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendances))
                            .route(web::post().to(attendance::submit_attendance)),
                    )
                    .service(
                        web::resource("/status").route(web::get().to(attendance::attendance_status)),
                    )
                    .service(web::resource("/me").route(web::get().to(attendance::my_attendances)))
                    .service(
                        web::resource("/export")
                            .route(web::get().to(attendance::export_attendances)),
                    ),
            )
            .service(
                web::scope("/members")
                    // /members
                    .service(
                        web::resource("")
                            .route(web::get().to(members::list_members))
                            .route(web::post().to(members::create_member)),
                    )
                    // /members/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(members::get_member))
                            .route(web::put().to(members::update_member))
                            .route(web::delete().to(members::delete_member)),
                    ),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(web::resource("/reports").route(web::get().to(reports::attendance_report))),
    );
}

// LOGIN
//  ├─ access_token (ACCESS_TOKEN_TTL)
//  └─ refresh_token (REFRESH_TOKEN_TTL)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new pair, the old refresh token is revoked
