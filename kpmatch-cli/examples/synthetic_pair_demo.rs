use kpmatch_cli::{
    DescriptorType, InlierWriter, MatchPipeline, load_descriptor_set, read_inlier_report, save_descriptor_set,
};
use kpmatch_core::{DescriptorError, DescriptorSet, Keypoint};
use kpmatch_homography::{RansacConfig, SyntheticScene};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

const LENGTH: usize = 61;

/// Two MLDB-like descriptor sets observing the same synthetic scene
fn make_sets(scene: &SyntheticScene) -> Result<(DescriptorSet, DescriptorSet), DescriptorError> {
    let data = scene.generate();
    let mut rng = StdRng::seed_from_u64(scene.seed ^ 0x5eed);

    let rows_a: Vec<Vec<u8>> = data
        .candidates
        .iter()
        .map(|_| (0..LENGTH).map(|_| rng.random()).collect())
        .collect();
    let rows_b: Vec<Vec<u8>> = rows_a
        .iter()
        .map(|row| {
            let mut row = row.clone();
            let bit = rng.random_range(0..LENGTH * 8);
            row[bit / 8] ^= 1 << (bit % 8);
            row
        })
        .collect();

    let kps_a: Vec<Keypoint> = data.candidates.iter().map(|m| m.source).collect();
    let kps_b: Vec<Keypoint> = data.candidates.iter().map(|m| m.target).collect();
    Ok((
        DescriptorSet::from_binary_rows(kps_a, &rows_a, LENGTH)?,
        DescriptorSet::from_binary_rows(kps_b, &rows_b, LENGTH)?,
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 Two-view Matching Demo");
    println!("=========================\n");

    let dir = std::env::temp_dir().join("kpmatch_pair_demo");
    std::fs::create_dir_all(&dir)?;

    let scene = SyntheticScene::default().with_counts(400, 250).with_noise(0.7).with_seed(3);
    let (a, b) = make_sets(&scene)?;
    save_descriptor_set(dir.join("pattern.json"), &a, DescriptorType::Mldb)?;
    save_descriptor_set(dir.join("image.json"), &b, DescriptorType::Mldb)?;
    println!("📷 Wrote {} + {} features to {}", a.len(), b.len(), dir.display());

    let a = load_descriptor_set(dir.join("pattern.json"))?;
    let b = load_descriptor_set(dir.join("image.json"))?;

    for (name, config) in [
        ("default", RansacConfig::default()),
        ("fast", RansacConfig::fast_preset()),
        ("precise", RansacConfig::precise_preset()),
    ] {
        let pipeline = MatchPipeline::new(config)?;
        let writer = InlierWriter::new(dir.join(format!("inliers_{name}.json")));
        let start = Instant::now();
        let output = pipeline.run_and_save(&a, &b, &writer)?;
        let report = read_inlier_report(writer.path())?;
        println!(
            "   {:<8} {} candidates → {} inliers ({} trials, {:.3}px mean error) in {:.2?}, report has {} points",
            name,
            output.candidates,
            output.estimate.inliers.len(),
            output.estimate.trials,
            output.estimate.mean_error,
            start.elapsed(),
            report.len()
        );
    }

    println!("\n🎯 Ground-truth homography:\n{}", scene.homography.matrix());
    Ok(())
}
