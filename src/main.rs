use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use talava_rig::config::Config;
use talava_rig::logging::init_logging;
use talava_rig::pose::Pose;
use talava_rig::rig::SkeletonNode;
use talava_rig::RigDriver;

const CONFIG_PATH: &str = "config.toml";

/// 1行1ポーズの JSON を読み、デモ用スケルトンを駆動して角度を表示する
///
/// 使い方: pose_replay [poses.jsonl]   (省略時は標準入力)
fn main() -> Result<()> {
    // 読み込み結果はサブスクライバ設定後に出す
    let (config, outcome) = Config::load_or_default(CONFIG_PATH);
    init_logging(&config.logging);
    outcome.log(Path::new(CONFIG_PATH));

    let input: Box<dyn BufRead> = match std::env::args().nth(1) {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).with_context(|| format!("failed to open {path}"))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut driver = RigDriver::from_config(&config)?;
    let skeleton = SkeletonNode::mixamo_humanoid();
    driver.attach(&skeleton);

    println!("=== Talava Rig - Pose Replay ===");
    println!("閾値: {}", driver.settings().confidence_threshold);
    println!();

    let mut frames = 0u32;
    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let pose: Pose = match serde_json::from_str(&line) {
            Ok(pose) => pose,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "skipping invalid pose");
                continue;
            }
        };

        driver.drive(&pose);
        frames += 1;

        let angles: Vec<String> = driver
            .angles()
            .map(|(joint, angle)| format!("{}={:.1}", joint.name(), angle))
            .collect();
        println!("[{:>5}] {}", frames, angles.join(" "));
    }

    println!();
    println!("ボーン回転 (度):");
    for (joint, bone) in driver.registry().joints().iter() {
        match skeleton.find(bone) {
            Some(node) => {
                let r = node.handle.rotation();
                let axis = driver.registry().axis_for(bone).axis;
                println!(
                    "  {:<15} {:<24} P={:>7.1} Y={:>7.1} R={:>7.1}  [{:?}={:.1}]",
                    joint.name(),
                    bone,
                    r.pitch.to_degrees(),
                    r.yaw.to_degrees(),
                    r.roll.to_degrees(),
                    axis,
                    r.get(axis).to_degrees()
                );
            }
            None => println!("  {:<15} {:<24} (missing)", joint.name(), bone),
        }
    }
    println!("{} フレーム処理しました", frames);

    Ok(())
}
