use std::path::Path;
use std::sync::Arc;

use crate::config::{Environment, EnvironmentPropertySource, TomlPropertySource};
use crate::constants::APP_PROFILES_ACTIVE;
use crate::error::ApplicationResult;
use crate::logging::LoggingConfig;

/// Griffin 应用程序引导
///
/// 负责构建阶段里与路由无关的部分：加载配置文件、叠加环境变量、初始化日志。
/// 路由加载在拿到 [`Environment`] 之后由调用方完成。
pub struct GriffinApplication {
    /// 应用名称
    name: String,

    /// 配置文件路径
    config_files: Vec<String>,

    /// 环境变量前缀
    env_prefix: String,

    /// 激活的 profiles
    profiles: Vec<String>,

    /// 是否显示 banner
    show_banner: bool,

    /// 日志配置，为 None 时从 Environment 读取
    logging_config: Option<LoggingConfig>,

    /// 是否初始化全局日志
    init_logging: bool,
}

impl GriffinApplication {
    /// 创建新的应用
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: vec!["application.toml".to_string()],
            env_prefix: "APP_".to_string(),
            profiles: Vec::new(),
            show_banner: true,
            logging_config: None,
            init_logging: true,
        }
    }

    /// 设置配置文件路径
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_files = vec![path.into()];
        self
    }

    /// 设置环境变量前缀
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 设置激活的 profiles
    pub fn profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = profiles;
        self
    }

    /// 设置是否显示 banner
    pub fn banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    /// 设置日志配置
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 不初始化全局日志（测试或由宿主程序负责时使用）
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 构建 Environment 并初始化日志
    pub fn prepare(self) -> ApplicationResult<Arc<Environment>> {
        let start_time = std::time::Instant::now();
        let env = Environment::new();

        // 环境变量配置源（优先级最高）
        env.add_property_source(Box::new(EnvironmentPropertySource::new(&self.env_prefix)));

        let active_profiles = self.resolve_profiles(&env);

        // 加载顺序（优先级从低到高）：application.toml -> application-{profile}.toml
        let mut loaded = Vec::new();
        for base_config in &self.config_files {
            if let Some(name) = Self::try_load_config_file(&env, base_config, 0)? {
                loaded.push(name);
            }
        }
        for (index, profile) in active_profiles.iter().enumerate() {
            for base_config in &self.config_files {
                let profile_config = Self::profile_config_path(base_config, profile);
                if let Some(name) =
                    Self::try_load_config_file(&env, &profile_config, 10 + index as i32)?
                {
                    loaded.push(name);
                }
            }
        }
        env.set_active_profiles(active_profiles.clone());

        if self.init_logging {
            let logging_config = self
                .logging_config
                .clone()
                .unwrap_or_else(|| LoggingConfig::from_environment(&env));
            logging_config.init()?;
        }

        if self.show_banner {
            self.print_banner();
        }

        tracing::info!("Starting {} application", self.name);
        for name in &loaded {
            tracing::info!("Loaded configuration from: {}", name);
        }
        if active_profiles.is_empty() {
            tracing::info!("No active profiles set, using default configuration");
        } else {
            tracing::info!("Active profiles: {:?}", active_profiles);
        }
        tracing::info!(
            "Environment prepared in {}ms",
            start_time.elapsed().as_millis()
        );

        Ok(Arc::new(env))
    }

    /// 优先级：代码设置 > {prefix}PROFILES_ACTIVE 环境变量
    fn resolve_profiles(&self, env: &Environment) -> Vec<String> {
        if !self.profiles.is_empty() {
            return self.profiles.clone();
        }
        env.get_string_array(APP_PROFILES_ACTIVE)
            .unwrap_or_default()
    }

    /// 例如：application.toml -> application-dev.toml
    fn profile_config_path(base_path: &str, profile: &str) -> String {
        match base_path.rfind('.') {
            Some(dot_pos) => {
                let (name, ext) = base_path.split_at(dot_pos);
                format!("{}-{}{}", name, profile, ext)
            }
            None => format!("{}-{}", base_path, profile),
        }
    }

    fn try_load_config_file(
        env: &Environment,
        config_file: &str,
        priority: i32,
    ) -> ApplicationResult<Option<String>> {
        if !Path::new(config_file).exists() {
            return Ok(None);
        }
        let source = TomlPropertySource::from_file(config_file)?.with_priority(priority);
        env.add_property_source(Box::new(source));
        Ok(Some(format!("{} (priority: {})", config_file, priority)))
    }

    fn print_banner(&self) {
        println!();
        println!(r"   ____      _  __  __ _       ");
        println!(r"  / ___|_ __(_)/ _|/ _(_)_ __  ");
        println!(r" | |  _| '__| | |_| |_| | '_ \ ");
        println!(r" | |_| | |  | |  _|  _| | | | |");
        println!(r"  \____|_|  |_|_| |_| |_|_| |_|");
        println!();
        println!("  :: Griffin ::        (v{})", env!("CARGO_PKG_VERSION"));
        println!();
    }
}

impl Default for GriffinApplication {
    fn default() -> Self {
        Self::new("GriffinApplication")
    }
}
