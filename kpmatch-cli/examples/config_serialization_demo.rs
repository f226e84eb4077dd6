use kpmatch_homography::{EstimatorBuilder, HomographyEstimator, RansacConfig, SyntheticScene};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 RANSAC Configuration Serialization Demo");
    println!("===========================================\n");

    let out_dir = std::env::temp_dir().join("kpmatch_config_demo");
    std::fs::create_dir_all(&out_dir)?;

    // Demo 1: Create configurations
    println!("📋 Demo 1: Creating Configurations");

    let fast_config = RansacConfig::fast_preset()
        .with_metadata("Interactive", "Small trial budget for live previews");
    let precise_config = RansacConfig::precise_preset()
        .with_metadata("Survey", "Symmetric scoring for offline processing");
    let custom_config = EstimatorBuilder::new()
        .error_threshold(3.0)
        .max_trials(1000)
        .seed(2024)
        .to_config()
        .with_metadata("Custom", "Looser threshold for blurry captures");

    println!("   • {}", fast_config.summary());
    println!("   • {}", precise_config.summary());
    println!("   • {}", custom_config.summary());

    // Demo 2: JSON
    println!("\n📄 Demo 2: JSON Serialization");
    let fast_json = fast_config.to_json()?;
    println!("{fast_json}");
    fast_config.save_json(out_dir.join("fast.json"))?;
    custom_config.save_json(out_dir.join("custom.json"))?;

    // Demo 3: TOML
    println!("\n📋 Demo 3: TOML Serialization");
    let precise_toml = precise_config.to_toml()?;
    println!("{precise_toml}");
    precise_config.save_toml(out_dir.join("precise.toml"))?;

    // Demo 4: Load, validate, run
    println!("\n🔍 Demo 4: Loading and Estimation");
    let loaded = vec![
        ("Fast (JSON)", RansacConfig::load_json(out_dir.join("fast.json"))?),
        ("Precise (TOML)", RansacConfig::load_toml(out_dir.join("precise.toml"))?),
        ("Custom (JSON)", RansacConfig::load_json(out_dir.join("custom.json"))?),
    ];

    let scene = SyntheticScene::default().with_counts(300, 200).with_seed(17).generate();
    println!("   Scene: {} candidates, {} true inliers", scene.candidates.len(), scene.true_inliers());

    println!("   {:<16} {:>8} {:>8} {:>8} {:>10}", "Config", "Inliers", "Trials", "Refits", "Time");
    println!("   {}", "-".repeat(56));
    for (name, config) in loaded {
        let estimator = HomographyEstimator::new(config)?;
        let start = Instant::now();
        let estimate = estimator.estimate(&scene.candidates)?;
        println!(
            "   {:<16} {:>8} {:>8} {:>8} {:>10.2?}",
            name,
            estimate.inliers.len(),
            estimate.trials,
            estimate.refinements,
            start.elapsed()
        );
    }

    // Demo 5: Round trip
    println!("\n🔄 Demo 5: Round-trip Check");
    let from_json = RansacConfig::from_json(&custom_config.to_json()?)?;
    let from_toml = RansacConfig::from_toml(&custom_config.to_toml()?)?;
    assert_eq!(from_json, custom_config);
    assert_eq!(from_toml, custom_config);
    println!("   ✅ JSON and TOML round trips are lossless");

    println!("\n📁 Files written to {}", out_dir.display());
    Ok(())
}
