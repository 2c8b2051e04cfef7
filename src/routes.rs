use crate::{
    api::{
        attendance, courses, dashboard, events, grades, notifications, reports, students, survey,
        survey_questions, upload, users,
    },
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
                web::resource("/setup-first-admin")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::setup_first_admin)),
            ),
    );

    // Protected routes, all behind the session gate
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    .service(
                        web::resource("/pending/students")
                            .route(web::get().to(users::pending_students)),
                    )
                    .service(
                        web::resource("/pending/faculty")
                            .route(web::get().to(users::pending_faculty)),
                    )
                    .service(
                        web::resource("/pending/admins").route(web::get().to(users::pending_admins)),
                    )
                    .service(web::resource("/active").route(web::get().to(users::active_users)))
                    .service(
                        web::resource("/suspended").route(web::get().to(users::suspended_users)),
                    )
                    .service(web::resource("/faculty").route(web::get().to(users::active_faculty)))
                    .service(
                        web::resource("/approve/{user_id}")
                            .route(web::put().to(users::approve_user)),
                    )
                    .service(
                        web::resource("/reject/{user_id}")
                            .route(web::delete().to(users::reject_user)),
                    )
                    .service(
                        web::resource("/suspend/{user_id}")
                            .route(web::put().to(users::suspend_user)),
                    )
                    .service(
                        web::resource("/reactivate/{user_id}")
                            .route(web::put().to(users::reactivate_user)),
                    )
                    .service(web::resource("/{user_id}").route(web::delete().to(users::delete_user))),
            )
            .service(
                web::scope("/students")
                    .service(web::resource("/search").route(web::get().to(students::search)))
                    .service(
                        web::resource("/by-course/{course_id}")
                            .route(web::get().to(students::by_course)),
                    )
                    .service(
                        web::resource("/me")
                            .route(web::get().to(students::my_profile))
                            .route(web::put().to(students::update_my_profile)),
                    )
                    .service(web::resource("/me/courses").route(web::get().to(students::my_courses)))
                    .service(web::resource("/me/enroll").route(web::put().to(students::enroll_me)))
                    .service(
                        web::resource("/me/unenroll").route(web::put().to(students::unenroll_me)),
                    )
                    .service(
                        web::resource("/manage-enroll/{student_id}/{course_id}")
                            .route(web::put().to(students::manage_enroll)),
                    )
                    .service(
                        web::resource("/manage-unenroll/{student_id}/{course_id}")
                            .route(web::put().to(students::manage_unenroll)),
                    )
                    // exports sit before the catch-all {user_id} on purpose
                    .service(web::resource("/export/all").route(web::get().to(reports::export_all)))
                    .service(
                        web::resource("/export/{course_id}")
                            .route(web::get().to(reports::export_course)),
                    )
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(students::get_student))
                            .route(web::put().to(students::update_student)),
                    ),
            )
            .service(
                web::scope("/courses")
                    .service(
                        web::resource("")
                            .route(web::get().to(courses::list_courses))
                            .route(web::post().to(courses::create_course)),
                    )
                    .service(
                        web::resource("/my-courses").route(web::get().to(courses::my_courses)),
                    )
                    .service(
                        web::resource("/{course_id}")
                            .route(web::get().to(courses::get_course))
                            .route(web::put().to(courses::update_course))
                            .route(web::delete().to(courses::delete_course)),
                    ),
            )
            .service(
                web::scope("/events")
                    .service(
                        web::resource("")
                            .route(web::get().to(events::list_events))
                            .route(web::post().to(events::create_event)),
                    )
                    .service(
                        web::resource("/{event_id}")
                            .route(web::get().to(events::get_event))
                            .route(web::put().to(events::update_event))
                            .route(web::delete().to(events::delete_event)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(notifications::list_notifications))
                            .route(web::post().to(notifications::create_notification)),
                    )
                    .service(
                        web::resource("/{notification_id}")
                            .route(web::delete().to(notifications::delete_notification)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
                    .service(
                        web::resource("/batch").route(web::post().to(attendance::batch_attendance)),
                    )
                    .service(web::resource("/me").route(web::post().to(attendance::self_check_in)))
                    .service(
                        web::resource("/me/courses")
                            .route(web::get().to(attendance::my_attended_courses)),
                    )
                    .service(
                        web::resource("/me/stats/{course_id}")
                            .route(web::get().to(attendance::my_monthly_stats)),
                    )
                    .service(
                        web::resource("/me/daily/{course_id}/{year}/{month}")
                            .route(web::get().to(attendance::my_daily_records)),
                    ),
            )
            .service(
                web::scope("/grades")
                    .service(
                        web::resource("/course/{course_id}")
                            .route(web::get().to(grades::course_gradebook)),
                    )
                    .service(web::resource("/batch").route(web::post().to(grades::batch_grades)))
                    .service(web::resource("/me").route(web::get().to(grades::my_grades)))
                    .service(
                        web::resource("/student/{user_id}")
                            .route(web::get().to(grades::student_grades)),
                    ),
            )
            .service(
                web::scope("/survey")
                    .service(web::resource("").route(web::post().to(survey::submit_survey)))
                    .service(
                        web::resource("/check-today").route(web::get().to(survey::check_today)),
                    )
                    .service(
                        web::resource("/results").route(web::get().to(survey::survey_results)),
                    ),
            )
            .service(
                web::scope("/survey-questions")
                    .service(
                        web::resource("/random")
                            .route(web::get().to(survey_questions::random_questions)),
                    )
                    .service(
                        web::resource("/seed")
                            .route(web::post().to(survey_questions::seed_questions)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(
                        web::resource("/admin-stats").route(web::get().to(dashboard::admin_stats)),
                    ),
            )
            .service(
                web::scope("/upload")
                    .service(
                        web::resource("/signature").route(web::get().to(upload::upload_signature)),
                    ),
            ),
    );
}
