//! The `serve` subcommand as a separate privileged process speaking JSON lines.

use image::{ImageBuffer, Rgb, RgbImage};
use image_resizer::{ErrorKind, Message, ResizeOutcome};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use tempfile::TempDir;

#[test]
fn serve_answers_each_request_on_stdout() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("imageresizer");
    let source = tmp.path().join("photo.png");
    let img: RgbImage = ImageBuffer::from_pixel(80, 60, Rgb([200, 100, 50]));
    img.save(&source).unwrap();

    let config = tmp.path().join("config.json");
    std::fs::write(
        &config,
        serde_json::json!({ "destinationDir": dest, "revealOutput": false }).to_string(),
    )
    .unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_image-resizer"))
        .arg("serve")
        .arg("--config")
        .arg(&config)
        .env("HOME", tmp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    {
        let mut stdin = child.stdin.take().unwrap();
        let ok = serde_json::json!({
            "channel": "image:resize",
            "requestId": "6f1f6c64-7c55-4b51-9d3c-1d2d0c7f0a11",
            "imgPath": source,
            "width": "40",
            "height": 30,
            "dest": "/should/be/ignored",
        });
        let missing = serde_json::json!({
            "channel": "image:resize",
            "requestId": "0b8e3a0e-2f4d-4c55-8a63-6f0e1f7b9c22",
            "imgPath": tmp.path().join("missing.png"),
            "width": "10",
            "height": "10",
        });
        writeln!(stdin, "{}", ok).unwrap();
        writeln!(stdin, "this line is not json").unwrap();
        writeln!(stdin, "{}", missing).unwrap();
        // Dropping stdin closes the request channel; the service drains and exits.
    }

    let stdout = child.stdout.take().unwrap();
    let messages: Vec<Message> = BufReader::new(stdout)
        .lines()
        .map(|line| Message::parse_line(&line.unwrap()).unwrap())
        .collect();
    assert!(child.wait().unwrap().success());

    assert_eq!(messages.len(), 2);
    let mut success = 0;
    let mut failure = 0;
    for message in messages {
        let Message::Done(done) = message else {
            panic!("only image:done messages are expected on stdout");
        };
        match done.outcome {
            ResizeOutcome::Success { output_path } => {
                assert_eq!(done.request_id.to_string(), "6f1f6c64-7c55-4b51-9d3c-1d2d0c7f0a11");
                assert_eq!(output_path, dest.join("photo.png"));
                success += 1;
            }
            ResizeOutcome::Failure { kind, .. } => {
                assert_eq!(done.request_id.to_string(), "0b8e3a0e-2f4d-4c55-8a63-6f0e1f7b9c22");
                assert_eq!(kind, ErrorKind::SourceRead);
                failure += 1;
            }
        }
    }
    assert_eq!((success, failure), (1, 1));
    assert_eq!(image::image_dimensions(dest.join("photo.png")).unwrap(), (40, 30));
    assert!(!std::path::Path::new("/should/be/ignored").exists());
}
