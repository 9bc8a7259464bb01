use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;

mod config;
mod controllers;
mod models;
mod routes;
mod services;
mod utils;

use config::{AppConfig, CONFIG};
use services::CatalogService;

fn build_cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET"])
        .allow_any_header()
        .max_age(3600);

    if config.allows_any_origin() {
        cors.allow_any_origin()
    } else {
        config
            .cors_allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 加载.env文件
    dotenv::dotenv().ok();

    // 初始化日志
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config: &AppConfig = &CONFIG;
    log::info!("上游卡牌 API: {}", config.api_base_url);

    // 所有 worker 共享同一个 HTTP 客户端与筛选项缓存
    let catalog = web::Data::new(CatalogService::new(config)?);

    let (host, port) = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("API 文档: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(catalog.clone())
            .wrap(middleware::Logger::default())
            .wrap(build_cors(&CONFIG))
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("无法绑定 {host}:{port}"))?
    .run()
    .await
    .context("HTTP 服务器异常退出")?;

    Ok(())
}
