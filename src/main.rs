use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use clash_switchboard_lib::{
    app::{
        dispatcher,
        messages::{MessageRequest, MessageResponse},
        setup,
    },
    core::{
        config::loader as cfg_loader,
        permission::{origin_pattern, Interaction},
        store::{Profile, ThemeMode},
    },
    events::TracingEventBus,
    logging,
};

#[derive(Parser, Debug)]
#[command(name = "clash-switchboard", version, about = "Point the system proxy at a Clash controller profile")]
struct Cli {
    /// 配置基目录（默认 $CLASH_SWITCHBOARD_HOME 或系统配置目录）
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 发送一条消息（ENABLE_PROXY / GET_STATE / SWITCH_CONFIG ...）并打印响应
    Send {
        #[arg(value_name = "TYPE")]
        kind: String,
        /// JSON 负载，例如 '{"configId":"..."}'
        payload: Option<String>,
    },
    /// 运行启动钩子（指示灯 + 自动切换）
    Startup,
    /// 授权访问非本地控制器主机
    Grant { host: String },
    /// 撤销主机授权
    Revoke { host: String },
    /// 列出已授权的主机
    Grants,
    /// 管理配置
    Profiles {
        #[command(subcommand)]
        cmd: ProfilesCmd,
    },
    /// 设置主题：light | dark | system
    Theme { mode: String },
}

#[derive(Subcommand, Debug)]
enum ProfilesCmd {
    Add {
        name: String,
        host: String,
        port: u16,
        secret: Option<String>,
    },
    Remove { id: String },
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the command ran but reported failure.
async fn run(cli: Cli) -> Result<bool> {
    let base = cli.config_dir.unwrap_or_else(cfg_loader::base_dir);
    let config = cfg_loader::load_or_init_at(&base)
        .with_context(|| format!("load config under {}", base.display()))?;
    logging::init_logging(&config.logging);
    let ctx = setup::from_config(&base, config, Arc::new(TracingEventBus));
    let orch = &ctx.orchestrator;

    match cli.cmd {
        Command::Send { kind, payload } => {
            let mut req = MessageRequest::new(kind);
            if let Some(raw) = payload {
                let value = serde_json::from_str(&raw).context("payload is not valid JSON")?;
                req = req.with_payload(value);
            }
            let resp = dispatcher::handle_message(orch, req).await;
            print_response(&resp)?;
            Ok(resp.success)
        }
        Command::Startup => {
            let outcome = setup::on_startup(orch).await?;
            println!("{outcome:?}");
            Ok(true)
        }
        Command::Grant { host } => {
            let granted = orch.gate().ensure_permission(&host, Interaction::UserGesture).await;
            println!("{} {}", origin_pattern(&host), if granted { "granted" } else { "denied" });
            Ok(granted)
        }
        Command::Revoke { host } => {
            let removed = orch.gate().revoke_permission(&host).await;
            println!("{} {}", origin_pattern(&host), if removed { "revoked" } else { "not granted" });
            Ok(true)
        }
        Command::Grants => {
            for origin in orch.gate().granted_origins().await {
                println!("{origin}");
            }
            Ok(true)
        }
        Command::Profiles { cmd } => match cmd {
            ProfilesCmd::Add { name, host, port, secret } => {
                let mut profile = Profile::new(name, host, port);
                if let Some(secret) = secret {
                    profile = profile.with_secret(secret);
                }
                orch.store().add_config(profile.clone()).await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
                Ok(true)
            }
            ProfilesCmd::Remove { id } => {
                if orch.store().get_config_by_id(&id).await?.is_none() {
                    bail!("no profile with id {id}");
                }
                orch.store().delete_config(&id).await?;
                Ok(true)
            }
            ProfilesCmd::List => {
                let configs = orch.store().get_configs().await?;
                println!("{}", serde_json::to_string_pretty(&configs)?);
                Ok(true)
            }
        },
        Command::Theme { mode } => {
            let Some(theme) = ThemeMode::parse(&mode) else {
                bail!("unknown theme mode {mode}, expected light | dark | system");
            };
            orch.store().set_theme_mode(theme).await?;
            Ok(true)
        }
    }
}

fn print_response(resp: &MessageResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(resp)?);
    Ok(())
}
