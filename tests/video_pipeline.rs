// Video pipeline round trip against a real ffmpeg toolchain. Each test
// no-ops with a note when ffmpeg/ffprobe are not installed.

use std::path::Path;
use std::process::Command;

use elascope::config::AnalysisConfig;
use elascope::video::pipeline;
use elascope::video::toolchain::FfmpegToolchain;

fn toolchain_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

/// Generate a 1 second, 10 fps test pattern with a sine audio track.
fn make_test_video(path: &Path) {
    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=1:size=128x72:rate=10",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=440:duration=1",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
        ])
        .arg(path)
        .output()
        .expect("failed to execute ffmpeg");
    assert!(
        output.status.success(),
        "ffmpeg: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn count_frames(path: &Path) -> u64 {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=nb_read_frames",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .expect("failed to execute ffprobe");
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .expect("unparseable frame count")
}

fn has_audio(path: &Path) -> bool {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .expect("failed to execute ffprobe");
    String::from_utf8_lossy(&output.stdout).trim() == "audio"
}

#[tokio::test]
async fn round_trip_preserves_frame_count_and_audio() {
    if !toolchain_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }

    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("input.mp4");
    make_test_video(&input);

    let output = scratch.path().join("input_ela.mp4");
    let config = AnalysisConfig {
        workers: 4,
        ..AnalysisConfig::default()
    };
    pipeline::process_video(&input, &output, &config, &FfmpegToolchain)
        .await
        .unwrap();

    assert!(output.exists());
    assert_eq!(count_frames(&output), count_frames(&input));
    assert!(has_audio(&output), "audio track must be remuxed");
}

#[tokio::test]
async fn fixed_frame_rate_is_applied() {
    if !toolchain_available() {
        eprintln!("skipping: ffmpeg/ffprobe not on PATH");
        return;
    }

    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("input.mp4");
    make_test_video(&input);

    let output = scratch.path().join("out.mp4");
    let config = AnalysisConfig {
        workers: 2,
        frame_rate: Some(10),
        ..AnalysisConfig::default()
    };
    pipeline::process_video(&input, &output, &config, &FfmpegToolchain)
        .await
        .unwrap();
    assert_eq!(count_frames(&output), 10);
}
