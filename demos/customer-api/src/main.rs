use customer_api::app;
use griffin_core::prelude::*;
use griffin_web::constants::SERVER_PORT;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let env = GriffinApplication::new("customer-api")
        .prepare()
        .context("Failed to prepare application environment")?;

    // 与常见托管平台一致，裸 PORT 变量也能指定端口，APP_SERVER_PORT 优先
    if let Ok(port) = std::env::var("PORT") {
        env.add_property_source(Box::new(
            MapPropertySource::new("port")
                .with_property(SERVER_PORT, ConfigValue::String(port))
                .with_priority(90),
        ));
    }

    let server = app::build_server(&env)?;
    server.run().await.context("Web server failed")?;

    Ok(())
}
