//! A population clustered around one representant speciates into a single
//! species; a genome far enough away founds a second one.

use neat_core::{Genome, InnovationPool, NeatParams, Species, SpeciesId};
use rand::SeedableRng;

fn assign(genomes: &[Genome], species: &mut Vec<Species>, params: &NeatParams) {
    'genome: for (idx, genome) in genomes.iter().enumerate() {
        for s in species.iter_mut() {
            if s.is_compatible(genome, params) {
                s.add_member(neat_core::GenomeId(idx));
                continue 'genome;
            }
        }
        let mut new_species = Species::new(SpeciesId(species.len()), genome.clone());
        new_species.add_member(neat_core::GenomeId(idx));
        species.push(new_species);
    }
}

#[test]
fn compatible_population_forms_a_single_species() {
    let params = NeatParams::new(2, 1);
    let mut pool = InnovationPool::new(4);
    let mut rng = rand::rngs::StdRng::seed_from_u64(5);

    let representant = Genome::seed(2, 1, &mut pool, &mut rng, &params);
    let mut genomes = vec![representant.clone()];
    for _ in 0..9 {
        let mut g = representant.clone();
        g.mutate(&mut rng, &mut pool, &params);
        genomes.push(g);
    }

    let mut species = vec![Species::new(SpeciesId(0), representant)];
    assign(&genomes, &mut species, &params);
    species.retain(|s| !s.members.is_empty());

    assert_eq!(species.len(), 1, "every genome should fall within threshold");
}

#[test]
fn a_sufficiently_distant_genome_founds_a_new_species() {
    let params = NeatParams::new(2, 1);
    let mut pool = InnovationPool::new(4);
    let mut rng = rand::rngs::StdRng::seed_from_u64(5);

    let representant = Genome::seed(2, 1, &mut pool, &mut rng, &params);
    let mut genomes = vec![representant.clone()];
    for _ in 0..9 {
        let mut g = representant.clone();
        g.mutate(&mut rng, &mut pool, &params);
        genomes.push(g);
    }

    // Drive a genome far enough from the representant by repeated
    // structural mutation until its distance exceeds the threshold.
    let mut outlier = representant.clone();
    for _ in 0..200 {
        outlier.mutate(&mut rng, &mut pool, &params);
        if outlier.distance(&representant, &params) >= params.compatibility_threshold {
            break;
        }
    }
    genomes.push(outlier);

    let mut species = vec![Species::new(SpeciesId(0), representant)];
    assign(&genomes, &mut species, &params);
    species.retain(|s| !s.members.is_empty());

    assert_eq!(
        species.len(),
        2,
        "the outlier should be incompatible with the first species"
    );
}
