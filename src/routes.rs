use crate::{
    api::{asset, asset_request, company, report, user},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Responder, get, guard, middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    protected: Limiter,
    mutation: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            protected: build_limiter(config.rate_protected_per_min)?,
            mutation: build_limiter(config.rate_mutation_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit of {requests_per_min} requests per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiters: &Limiters) {
    let mutation = limiters.mutation.clone();

    // Public routes
    cfg.service(index);

    // Protected routes
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/user")
                    // /user
                    .service(
                        web::resource("")
                            .route(web::put().to(user::upsert_user))
                            .route(web::get().to(user::current_user)),
                    )
                    // /user/role
                    .service(web::resource("/role").route(web::get().to(user::role_flags))),
            )
            .service(
                web::scope("/assets")
                    // /assets
                    .service(web::resource("").route(web::post().to(asset::add_asset)))
                    // /assets/count, ahead of /{asset_id}
                    .service(web::resource("/count").route(web::get().to(asset::asset_count)))
                    // /assets/{asset_id}
                    .service(
                        web::resource("/{asset_id}")
                            .route(web::get().to(asset::get_asset))
                            .route(web::patch().to(asset::update_asset))
                            .route(web::delete().to(asset::delete_asset)),
                    )
                    // /assets/{asset_id}/requests
                    .service(
                        web::resource("/{asset_id}/requests")
                            .wrap(mutation.clone())
                            .route(web::post().to(asset_request::submit_request)),
                    )
                    // /assets/{asset_id}/requests/{request_id}/approve
                    .service(
                        web::resource("/{asset_id}/requests/{request_id}/approve")
                            .wrap(mutation.clone())
                            .route(web::put().to(asset_request::approve_request)),
                    )
                    // /assets/{asset_id}/requests/{request_id}/return
                    .service(
                        web::resource("/{asset_id}/requests/{request_id}/return")
                            .wrap(mutation.clone())
                            .route(web::put().to(asset_request::return_asset)),
                    ),
            )
            .service(
                web::scope("/requests")
                    // /requests/monthly
                    .service(
                        web::resource("/monthly")
                            .route(web::get().to(asset_request::monthly_requests)),
                    )
                    // /requests/pending/count
                    .service(
                        web::resource("/pending/count")
                            .route(web::get().to(asset_request::pending_count)),
                    )
                    // /requests/mine/count
                    .service(
                        web::resource("/mine/count")
                            .route(web::get().to(asset_request::own_request_count)),
                    )
                    // /requests/{request_id}, reads skip the mutation limiter
                    .service(
                        web::resource("/{request_id}")
                            .guard(guard::Get())
                            .route(web::get().to(asset_request::get_request)),
                    )
                    .service(
                        web::resource("/{request_id}")
                            .guard(guard::Delete())
                            .wrap(mutation.clone())
                            .route(web::delete().to(asset_request::cancel_request)),
                    )
                    // /requests/{request_id}/reject
                    .service(
                        web::resource("/{request_id}/reject")
                            .wrap(mutation)
                            .route(web::put().to(asset_request::reject_request)),
                    ),
            )
            .service(
                web::scope("/reports").service(
                    web::resource("/asset-types")
                        .route(web::get().to(report::asset_type_breakdown)),
                ),
            )
            .service(
                web::scope("/company")
                    // /company/members
                    .service(web::resource("/members").route(web::post().to(company::add_member)))
                    // /company/members/count, ahead of /{email}
                    .service(
                        web::resource("/members/count").route(web::get().to(company::team_count)),
                    )
                    // /company/members/{email}
                    .service(
                        web::resource("/members/{email}")
                            .route(web::delete().to(company::remove_member)),
                    ),
            )
            // /package
            .service(
                web::resource("/package")
                    .route(web::put().to(user::record_package))
                    .route(web::get().to(user::get_package)),
            ),
    );
}
