//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod diseases;
pub mod error;
pub mod health;
pub mod medications;
pub mod preferences;
pub mod reminders;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`. Literal segments such as
/// `/reminders/upcoming` are registered before the `{id}` routes they would
/// otherwise collide with.
///
/// ```no_run
/// use actix_web::{App, web};
/// use medminder::inbound::http::api_routes;
///
/// let app = App::new().service(web::scope("/api/v1").configure(api_routes));
/// ```
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::path_config())
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::delete_current_user)
        .service(users::bind_phone)
        .service(users::verify_phone)
        .service(users::bind_wechat)
        .service(users::bind_email)
        .service(preferences::get_preferences)
        .service(preferences::update_preferences)
        .service(medications::create_medication)
        .service(medications::list_medications)
        .service(medications::search_medication)
        .service(medications::medications_for_disease)
        .service(medications::get_medication)
        .service(medications::update_medication)
        .service(medications::delete_medication)
        .service(reminders::generate_usage_schedule)
        .service(reminders::create_reminder)
        .service(reminders::list_reminders)
        .service(reminders::upcoming_reminders)
        .service(reminders::get_reminder)
        .service(reminders::update_reminder)
        .service(reminders::delete_reminder)
        .service(diseases::create_disease)
        .service(diseases::list_diseases)
        .service(diseases::remove_recommendation)
        .service(diseases::get_disease)
        .service(diseases::update_disease)
        .service(diseases::delete_disease)
        .service(diseases::add_recommendation);
}
