//! 应用装配

use griffin_core::prelude::*;
use griffin_web::prelude::*;

use crate::controller::{CustomerController, RootController};
use crate::dao::CustomerDao;
use crate::service::CustomerService;

/// 所有组件的 provider
pub fn providers() -> ProviderMap {
    let mut providers = ProviderMap::new();
    providers
        .register_singleton(|_| Ok(CustomerDao::new()))
        .register_singleton(|r| Ok(CustomerService::new(r.resolve::<CustomerDao>()?)))
        .register_singleton(|r| Ok(CustomerController::new(r.resolve::<CustomerService>()?)))
        .register_singleton(|_| Ok(RootController));
    providers
}

/// 按加载顺序排列的控制器
pub fn controllers() -> [ControllerType; 2] {
    [
        ControllerType::of::<RootController>(),
        ControllerType::of::<CustomerController>(),
    ]
}

/// 加载所有控制器的路由
pub fn build_router(resolver: &dyn Resolver) -> Result<RouterHandle<AxumRouter>, LoadError> {
    RouteLoader::from_controllers(&controllers()).load(resolver, AxumRouter::new())
}

/// 组装 Web 服务器
pub fn build_server(env: &Environment) -> anyhow::Result<GriffinWebServer> {
    let providers = providers();
    let router = build_router(&providers).context("Failed to load controller routes")?;
    Ok(GriffinWebServer::from_environment(env, router.into_router()))
}
