//! A run's state must serialise and deserialise without losing fitness,
//! population size, or species count, and the restored driver must be
//! able to continue evolving.

use neat_core::{FeedforwardNetwork, NeatParams, Neat, NeatSnapshot, NeuralNetwork, Real};

const XOR_ROWS: [([Real; 2], Real); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn evaluate(neat: &mut Neat) {
    let ids: Vec<_> = neat.population().ids().collect();
    for id in ids {
        let genome = neat.population().get(id).clone();
        let mut net = FeedforwardNetwork::new();
        genome.decode(&mut net);
        net.finalize();

        let mut error = 0.0;
        for (inputs, target) in XOR_ROWS {
            let out = net.activate(&inputs).unwrap();
            error += (target - out[0]).powi(2);
        }
        neat.population_mut().get_mut(id).fitness = 4.0 - error;
    }
}

#[test]
fn text_round_trip_preserves_logical_state_and_can_resume() {
    let mut params = NeatParams::new(2, 1);
    params.initial_population_size = 50;
    params.target_population_size = 50;
    let mut neat = Neat::init(params, 7).unwrap();

    for _ in 0..20 {
        evaluate(&mut neat);
        neat.epoch().unwrap();
    }

    let before_fitness = neat.best_ever().unwrap().fitness;
    let before_population_size = neat.population().len();
    let before_species_count = neat.species().len();

    let snapshot = neat.to_snapshot();
    let text = snapshot.to_text();
    let restored_snapshot = NeatSnapshot::from_text(&text).unwrap();
    let mut restored = Neat::from_snapshot(restored_snapshot, 99).unwrap();

    assert_eq!(restored.best_ever().unwrap().fitness, before_fitness);
    assert_eq!(restored.population().len(), before_population_size);
    assert_eq!(restored.species().len(), before_species_count);
    for (id, genome) in restored.population().iter() {
        let original = neat.population().get(id);
        assert_eq!(genome.gene_count(), original.gene_count());
    }

    evaluate(&mut restored);
    restored.epoch().unwrap();
    assert!(restored.best_ever().unwrap().fitness >= before_fitness);
}

#[test]
fn binary_round_trip_preserves_best_ever_fitness() {
    let mut params = NeatParams::new(2, 1);
    params.initial_population_size = 30;
    params.target_population_size = 30;
    let mut neat = Neat::init(params, 3).unwrap();

    for _ in 0..10 {
        evaluate(&mut neat);
        neat.epoch().unwrap();
    }

    let snapshot = neat.to_snapshot();
    let bytes = snapshot.to_binary().unwrap();
    let restored_snapshot = NeatSnapshot::from_binary(&bytes).unwrap();
    let restored = Neat::from_snapshot(restored_snapshot, 11).unwrap();

    assert_eq!(
        restored.best_ever().unwrap().fitness,
        neat.best_ever().unwrap().fitness
    );
}
