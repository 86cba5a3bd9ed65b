use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for shell-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the menu page
    Menu,
    /// Run a command and print its output
    Run {
        /// Command line, passed to the gateway as one string
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Menu => {
            let res = client.get(format!("{}/", base)).send().await?;
            let status = res.status();
            let body = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: gateway returned status {}", status);
                eprint!("{}", body);
                std::process::exit(1);
            }
            println!("{}", body);
        }
        Commands::Run { command } => {
            let command = command.join(" ");
            let res = client
                .post(format!("{}/run", base))
                .form(&[("cmd", command.as_str())])
                .send()
                .await?;
            let status = res.status();
            let body = res.text().await?;
            if !status.is_success() && status != reqwest::StatusCode::GATEWAY_TIMEOUT {
                eprintln!("Error: gateway returned status {}", status);
                eprint!("{}", body);
                std::process::exit(1);
            }
            print!("{}", extract_output(&body));
            if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
                eprintln!("(command timed out)");
                std::process::exit(124);
            }
        }
    }

    Ok(())
}

/// Pull the `<pre>` block out of the result page and undo HTML escaping.
fn extract_output(page: &str) -> String {
    let inner = page
        .split_once("<pre>")
        .and_then(|(_, rest)| rest.rsplit_once("</pre>"))
        .map_or(page, |(pre, _)| pre);

    inner
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
