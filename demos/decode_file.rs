use log::{debug, error, info};
use multipart_mixed::{MultipartMixed, Resource};
use std::fs::File;

fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let path = std::env::var("MULTIPART_FILE").expect("MULTIPART_FILE must be set");
    let content_type = std::env::var("MULTIPART_CONTENT_TYPE")
        .expect("MULTIPART_CONTENT_TYPE must be set")
        .parse::<mime::Mime>()
        .expect("Invalid MULTIPART_CONTENT_TYPE");

    let decoder = MultipartMixed::new();
    if !decoder.can_read(Some(&content_type)) {
        error!("Cannot decode {} bodies", content_type);
        return;
    }

    let file = File::open(&path).expect("Failed to open MULTIPART_FILE");

    match decoder.read(Some(&content_type), file) {
        Ok(artifacts) => {
            debug!("Decoded {} artifacts from {}", artifacts.len(), path);

            for artifact in artifacts.iter() {
                info!("{}: {} bytes", artifact.filename(), artifact.content_length());
                println!("{}\t{}", artifact.filename(), artifact.content_length());
            }
        }

        Err(e) => error!("Error: {}", e),
    }
}
