use std::path::PathBuf;

use quip_http::{ClientOptions, QuipClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let thread_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: export_thread <thread-id> [out-dir]"))?;
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let token = std::env::var("QUIP_TOKEN")?;
    let quip = QuipClient::from_token(token).with_options(ClientOptions {
        max_429_retries: 5,
        ..ClientOptions::default()
    });

    let Some(thread) = quip.get_thread(&thread_id).await else {
        anyhow::bail!("thread {thread_id} could not be fetched");
    };
    let title = thread["thread"]["title"].as_str().unwrap_or(&thread_id);
    let is_spreadsheet = thread["thread"]["type"].as_str() == Some("spreadsheet");

    let (extension, document) = if is_spreadsheet {
        ("xlsx", quip.get_xlsx(&thread_id).await)
    } else {
        ("docx", quip.get_docx(&thread_id).await)
    };

    for (extension, bytes) in [(extension, document), ("pdf", quip.get_pdf(&thread_id).await)] {
        match bytes {
            Some(bytes) => {
                let path = out_dir.join(format!("{title}.{extension}"));
                std::fs::write(&path, bytes)?;
                println!("wrote {}", path.display());
            }
            None => eprintln!("{extension} export of {title} failed"),
        }
    }

    if let Some(messages) = quip.get_thread_messages(&thread_id).await {
        let path = out_dir.join(format!("{title}.messages.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(&messages)?)?;
        println!("wrote {}", path.display());
    }

    println!("{}", serde_json::to_string(&quip.stats())?);
    Ok(())
}
