// ==========================================
// 农场地块管理系统 - 命令行入口
// ==========================================
// 子命令: init-db / import / field / config
// 输出: JSON（stdout），日志走 stderr
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use field_mgmt::app::{get_default_db_path, AppState};
use field_mgmt::logging;

#[derive(Parser, Debug)]
#[clap(name = "field-mgmt")]
#[clap(about = "种植户 / 农场 / 地块记录管理与 CSV 批量导入", version)]
struct Cli {
    /// 数据库文件路径
    #[clap(long, env = "FIELD_MGMT_DB_PATH", value_name = "FILE")]
    db: Option<String>,

    /// 输出 JSON 结构化日志
    #[clap(long)]
    json_logs: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 初始化数据库表结构（幂等）
    InitDb,

    /// 导入一个或多个 CSV / Excel 文件
    Import {
        #[clap(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// 按主键查看地块
    Field {
        pk: i64,

        /// 关联展开深度
        #[clap(long, default_value = "0")]
        depth: u32,
    },

    /// 查看或修改导入配置
    Config {
        #[clap(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// 列出全部配置（含默认值）
    List,
    /// 查看单个配置
    Get { key: String },
    /// 写入配置
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", field_mgmt::APP_NAME, field_mgmt::VERSION);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::InitDb => {
            print_json(&serde_json::json!({ "db_path": state.get_db_path(), "initialized": true }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { files } => {
            let outcomes = state.import_api.batch_import(files).await;
            let all_ok = outcomes.iter().all(|o| o.succeeded());
            print_json(&outcomes)?;
            Ok(if all_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Field { pk, depth } => {
            let field = state.field_api.get(pk, depth)?;
            print_json(&field)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            let config = &state.config_manager;
            match action {
                ConfigAction::List => {
                    let entries = config.list_configs().map_err(anyhow::Error::msg)?;
                    print_json(&entries)?;
                }
                ConfigAction::Get { key } => {
                    let entry = config
                        .list_configs()
                        .map_err(anyhow::Error::msg)?
                        .into_iter()
                        .find(|e| e.key == key)
                        .ok_or_else(|| anyhow::anyhow!("未知配置键: {}", key))?;
                    print_json(&entry)?;
                }
                ConfigAction::Set { key, value } => {
                    config.set_config_value(&key, &value).map_err(anyhow::Error::msg)?;
                    print_json(&serde_json::json!({ "key": key, "value": value }))?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
