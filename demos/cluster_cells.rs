use std::collections::HashMap;

use sctree::{
    ClusteringConfig, CutPolicy, DiversityAggregator, Observation, ObservationSet, Pipeline,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three small cell populations in a 3-gene expression space, with a 2D
    // projection attached as a plotting collaborator would supply it.
    let populations = [
        ("T", [5.0, 0.5, 0.2]),
        ("B", [0.3, 4.0, 0.4]),
        ("NK", [0.2, 0.6, 6.0]),
    ];
    let mut cells = Vec::new();
    let mut labels = HashMap::new();
    for (p, (label, center)) in populations.iter().enumerate() {
        for i in 0..6 {
            let jitter = 0.1 * i as f64;
            let features = center.iter().map(|c| c + jitter).collect();
            let id = format!("{label}-{i}");
            cells.push(Observation::new(id.clone(), features).with_projection(p as f64, jitter));
            labels.insert(id, (*label).to_string());
        }
    }
    let cells = ObservationSet::new(cells)?;

    // Two resolutions at once: every cell gets a coarse and a fine cluster.
    let config = ClusteringConfig::agglomerative(CutPolicy::Thresholds(vec![0.4, 3.0]));
    let results = Pipeline::new(config).run(&cells)?;
    println!("agglomerative paths:");
    for a in results.assignments() {
        println!("  {:>6}  {}", a.id(), a.path);
    }

    let records = DiversityAggregator::new(1.0).aggregate(&results, &labels)?;
    println!("diversity (order 1):");
    for r in &records {
        println!("  cluster {:>3}  size {:>2}  effective labels {:.3}", r.cluster, r.size, r.diversity);
    }

    // Recursive spectral partitioning, flattened by nesting.
    let spectral = Pipeline::new(ClusteringConfig::spectral()).run(&cells)?;
    println!("spectral clusters: {}", spectral.innermost_ids().len());

    Ok(())
}
