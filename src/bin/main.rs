//! mini-markup 命令行工具
//!
//! - `decode <file>`：打印解码后的标签树 (JSON)
//! - `render <file>`：以文件为模板挂载一个页面组件并打印 HTML，`--bindings` 另外打印事件绑定

use clap::{Parser, Subcommand};
use mini_markup::renderer::TagRenderer;
use mini_markup::{shared, Component, ComponentRef, EnvConfig, Environment, Placeholder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::error::Error as _;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mini-markup")]
#[command(about = "Decode and render HTML5 component markup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decoded tag tree as JSON
    Decode { file: PathBuf },
    /// Mount the file as a page component and print its HTML
    Render {
        file: PathBuf,

        /// Page fields as a JSON object
        #[arg(long, default_value = "{}")]
        data: String,

        /// Environment config as a JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also print the event bindings as JSON on stderr
        #[arg(long)]
        bindings: bool,
    },
}

/// 模板来自文件、字段来自 --data 的页面组件
#[derive(Default, Serialize, Deserialize)]
struct Page {
    #[serde(skip)]
    markup: String,
    #[serde(flatten)]
    data: Map<String, JsonValue>,
    _placeholder: Placeholder,
}

impl Component for Page {
    fn render(&self) -> String {
        self.markup.clone()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Decode { file } => decode(&file),
        Commands::Render {
            file,
            data,
            config,
            bindings,
        } => render(&file, &data, config.as_deref(), bindings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn decode(file: &Path) -> mini_markup::Result<()> {
    let tag = mini_markup::decode_reader(std::fs::File::open(file)?)?;
    println!("{}", serde_json::to_string_pretty(&tag)?);
    Ok(())
}

fn render(file: &Path, data: &str, config: Option<&Path>, bindings: bool) -> mini_markup::Result<()> {
    let config = match config {
        Some(path) => EnvConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EnvConfig::default(),
    };
    log::debug!("using {:?}", config);

    let page = Page {
        markup: std::fs::read_to_string(file)?,
        data: serde_json::from_str(data)?,
        _placeholder: Placeholder,
    };
    let page: ComponentRef = shared(page);

    let mut env = Environment::with_config(config.registry(), config);
    let root = env.mount(page)?;

    let mut renderer = TagRenderer::new(&env);
    println!("{}", renderer.render(&root)?);
    if bindings {
        eprintln!("{}", serde_json::to_string_pretty(renderer.event_bindings())?);
    }
    Ok(())
}
