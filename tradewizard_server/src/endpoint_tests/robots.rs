use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Days, TimeZone, Utc};
use tradewizard_engine::{
    db_types::{Json, NewRobot, Robot, Role},
    CatalogApi,
};
use twz_common::Money;

use super::{
    helpers::{authed_request, issue_token, public_request},
    mocks::MockCatalog,
};
use crate::{
    auth::JwtClaims,
    routes::{CreateRobotRoute, RobotsRoute},
};

fn demo_robot() -> Robot {
    let at = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
    Robot {
        id: "robot-1".to_string(),
        name: "Momentum Hunter".to_string(),
        description: "Trend-following robot".to_string(),
        category: "forex".to_string(),
        price: Money::from_units(150),
        currency: "USD".to_string(),
        features: Json(vec!["MT5".to_string()]),
        image_url: None,
        download_url: None,
        created_at: at,
        updated_at: at,
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_robots().returning(|| Ok(vec![demo_robot()]));
    catalog.expect_insert_robot().returning(|new_robot: NewRobot| {
        let mut robot = demo_robot();
        robot.name = new_robot.name;
        Ok(robot)
    });
    let api = CatalogApi::new(catalog);
    cfg.service(RobotsRoute::<MockCatalog>::new())
        .service(CreateRobotRoute::<MockCatalog>::new())
        .app_data(web::Data::new(api));
}

fn new_robot_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Breakout Bot",
        "description": "Range breakout strategy",
        "category": "crypto",
        "price": 9900,
        "currency": "USD",
        "features": ["backtested"]
    })
}

#[actix_web::test]
async fn anyone_can_list_robots() {
    let _ = env_logger::try_init().ok();
    let (status, body) = public_request(TestRequest::get().uri("/robots"), configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let robots: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(robots.as_array().unwrap().len(), 1);
    assert_eq!(robots[0]["name"], "Momentum Hunter");
}

#[actix_web::test]
async fn admins_can_create_robots() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(
        JwtClaims { sub: "admin-1".into(), name: "Admin".into(), roles: vec![Role::User, Role::Admin] },
        Utc::now() + Days::new(1),
    );
    let req = TestRequest::post().uri("/robots").set_json(new_robot_body());
    let (status, body) = authed_request(&token, req, configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let robot: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(robot["name"], "Breakout Bot");
}

#[actix_web::test]
async fn normal_users_cannot_create_robots() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(
        JwtClaims { sub: "user-1".into(), name: "User".into(), roles: vec![Role::User] },
        Utc::now() + Days::new(1),
    );
    let req = TestRequest::post().uri("/robots").set_json(new_robot_body());
    let err = authed_request(&token, req, configure).await.expect_err("Request should have been rejected");
    assert_eq!(err, "Insufficient permissions");
}
