//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod auth;
pub mod courses;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
pub mod students;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` route on a scope or app.
///
/// ```ignore
/// App::new().service(web::scope("/api").configure(student_records::inbound::http::configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .app_data(validation::path_config())
        .service(accounts::sign_up)
        .service(accounts::sign_in)
        .service(accounts::refresh)
        .service(accounts::logout)
        .service(students::create_student)
        .service(students::get_student)
        .service(students::update_student)
        .service(students::delete_student)
        .service(students::get_student_courses)
        .service(courses::list_course_students);
}
