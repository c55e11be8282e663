//! Persistence of a driver's full logical state.
//!
//! A line-oriented text format with a fixed field order is the primary,
//! tested wire contract; a `bincode` binary encoding of the same snapshot
//! is offered as a compact alternative.

use serde::{Deserialize, Serialize};

use crate::config::NeatParams;
use crate::error::{NeatError, NeatResult};
use crate::gene::Gene;
use crate::genome::Genome;
use crate::innovation::InnovationPool;
use crate::types::{InnovationNumber, NeuronId, Real};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSnapshot {
    pub id: usize,
    pub representant: Genome,
    /// Population indices (assigned in insertion order, see
    /// `NeatSnapshot::genomes`) of this species' members.
    pub member_indices: Vec<usize>,
    pub age: usize,
    pub stagnation_counter: usize,
    pub best_fitness_ever: Real,
    pub adjusted_fitness_sum: Real,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeatSnapshot {
    pub params: NeatParams,
    pub next_species_id: usize,
    pub best_ever_age: usize,
    pub best_ever: Option<Genome>,
    pub species: Vec<SpeciesSnapshot>,
    pub best_genomes: Vec<Genome>,
    pub pool: InnovationPool,
    /// The live population, in the order `GenomeId`s were assigned
    /// (contiguous from zero immediately after an epoch completes).
    pub genomes: Vec<Genome>,
}

impl NeatSnapshot {
    /// `bincode` binary encoding of the whole snapshot.
    pub fn to_binary(&self) -> NeatResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| NeatError::DeserializationMismatch(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> NeatResult<Self> {
        let (snapshot, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| NeatError::DeserializationMismatch(e.to_string()))?;
        Ok(snapshot)
    }

    /// The exact textual format: next-species-id; age-of-best-ever;
    /// compatibility threshold; a boolean followed (if true) by the
    /// best-ever genome; the species list prefixed by count; the
    /// best-genomes library prefixed by count; the innovation pool.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        writeln(&mut out, self.next_species_id);
        writeln(&mut out, self.best_ever_age);
        writeln(&mut out, self.params.compatibility_threshold);

        match &self.best_ever {
            Some(g) => {
                writeln(&mut out, true);
                write_genome(&mut out, g);
            }
            None => writeln(&mut out, false),
        }

        writeln(&mut out, self.species.len());
        for s in &self.species {
            write_species(&mut out, s);
        }

        writeln(&mut out, self.best_genomes.len());
        for g in &self.best_genomes {
            write_genome(&mut out, g);
        }

        write_pool(&mut out, &self.pool);
        write_params(&mut out, &self.params);

        writeln(&mut out, self.genomes.len());
        for g in &self.genomes {
            write_genome(&mut out, g);
        }

        out
    }

    pub fn from_text(text: &str) -> NeatResult<Self> {
        let mut lines = text.lines();
        let next_species_id = next_parsed(&mut lines)?;
        let best_ever_age = next_parsed(&mut lines)?;
        let compatibility_threshold: f64 = next_parsed(&mut lines)?;

        let has_best_ever: bool = next_parsed(&mut lines)?;
        let best_ever = if has_best_ever {
            Some(read_genome(&mut lines)?)
        } else {
            None
        };

        let species_count: usize = next_parsed(&mut lines)?;
        let mut species = Vec::with_capacity(species_count);
        for _ in 0..species_count {
            species.push(read_species(&mut lines)?);
        }

        let best_genomes_count: usize = next_parsed(&mut lines)?;
        let mut best_genomes = Vec::with_capacity(best_genomes_count);
        for _ in 0..best_genomes_count {
            best_genomes.push(read_genome(&mut lines)?);
        }

        let pool = read_pool(&mut lines)?;
        let mut params = read_params(&mut lines)?;
        params.compatibility_threshold = compatibility_threshold;

        let genome_count: usize = next_parsed(&mut lines)?;
        let mut genomes = Vec::with_capacity(genome_count);
        for _ in 0..genome_count {
            genomes.push(read_genome(&mut lines)?);
        }

        Ok(NeatSnapshot {
            params,
            next_species_id,
            best_ever_age,
            best_ever,
            species,
            best_genomes,
            pool,
            genomes,
        })
    }
}

fn writeln<T: std::fmt::Display>(out: &mut String, value: T) {
    out.push_str(&value.to_string());
    out.push('\n');
}

fn next_parsed<T: std::str::FromStr>(lines: &mut std::str::Lines<'_>) -> NeatResult<T> {
    let line = lines
        .next()
        .ok_or_else(|| NeatError::DeserializationMismatch("unexpected end of stream".into()))?;
    line.trim()
        .parse()
        .map_err(|_| NeatError::DeserializationMismatch(format!("could not parse {line:?}")))
}

/// Each genome serialises as: number-of-inputs, number-of-outputs,
/// fitness, gene-count, then each gene as `(innov, from, to, weight,
/// enabled)`.
fn write_genome(out: &mut String, genome: &Genome) {
    writeln(out, genome.input_count);
    writeln(out, genome.output_count);
    writeln(out, genome.fitness);
    writeln(out, genome.gene_count());
    for gene in genome.genes() {
        writeln(
            out,
            format!(
                "{} {} {} {} {}",
                gene.innov.get(),
                gene.from.get(),
                gene.to.get(),
                gene.weight,
                gene.enabled
            ),
        );
    }
}

fn read_genome(lines: &mut std::str::Lines<'_>) -> NeatResult<Genome> {
    let input_count: usize = next_parsed(lines)?;
    let output_count: usize = next_parsed(lines)?;
    let fitness: Real = next_parsed(lines)?;
    let gene_count: usize = next_parsed(lines)?;

    let mut genome = Genome::empty(input_count, output_count);
    for _ in 0..gene_count {
        let line = lines.next().ok_or_else(|| {
            NeatError::DeserializationMismatch("missing gene line".into())
        })?;
        let mut parts = line.split_whitespace();
        let innov: u32 = parse_part(&mut parts)?;
        let from: u32 = parse_part(&mut parts)?;
        let to: u32 = parse_part(&mut parts)?;
        let weight: Real = parse_part(&mut parts)?;
        let enabled: bool = parse_part(&mut parts)?;

        let gene = Gene::new(
            InnovationNumber(innov),
            NeuronId(from),
            NeuronId(to),
            weight,
        );
        genome.insert_gene_with_enabled(gene, enabled);
    }
    genome.fitness = fitness;
    Ok(genome)
}

fn parse_part<T: std::str::FromStr>(parts: &mut std::str::SplitWhitespace<'_>) -> NeatResult<T> {
    parts
        .next()
        .ok_or_else(|| NeatError::DeserializationMismatch("missing gene field".into()))?
        .parse()
        .map_err(|_| NeatError::DeserializationMismatch("could not parse gene field".into()))
}

fn write_species(out: &mut String, species: &SpeciesSnapshot) {
    writeln(out, species.id);
    writeln(out, species.age);
    writeln(out, species.stagnation_counter);
    writeln(out, species.best_fitness_ever);
    writeln(out, species.adjusted_fitness_sum);
    write_genome(out, &species.representant);
    writeln(out, species.member_indices.len());
    for &idx in &species.member_indices {
        writeln(out, idx);
    }
}

fn read_species(lines: &mut std::str::Lines<'_>) -> NeatResult<SpeciesSnapshot> {
    let id: usize = next_parsed(lines)?;
    let age: usize = next_parsed(lines)?;
    let stagnation_counter: usize = next_parsed(lines)?;
    let best_fitness_ever: Real = next_parsed(lines)?;
    let adjusted_fitness_sum: Real = next_parsed(lines)?;
    let representant = read_genome(lines)?;
    let member_count: usize = next_parsed(lines)?;
    let mut member_indices = Vec::with_capacity(member_count);
    for _ in 0..member_count {
        member_indices.push(next_parsed(lines)?);
    }
    Ok(SpeciesSnapshot {
        id,
        representant,
        member_indices,
        age,
        stagnation_counter,
        best_fitness_ever,
        adjusted_fitness_sum,
    })
}

fn write_pool(out: &mut String, pool: &InnovationPool) {
    let encoded = bincode::serde::encode_to_vec(pool, bincode::config::standard())
        .expect("innovation pool is always encodable");
    writeln(out, encoded.len());
    writeln(out, hex_encode(&encoded));
}

fn read_pool(lines: &mut std::str::Lines<'_>) -> NeatResult<InnovationPool> {
    let len: usize = next_parsed(lines)?;
    let line = lines
        .next()
        .ok_or_else(|| NeatError::DeserializationMismatch("missing innovation pool line".into()))?;
    let bytes = hex_decode(line)?;
    if bytes.len() != len {
        return Err(NeatError::DeserializationMismatch(
            "innovation pool length mismatch".into(),
        ));
    }
    let (pool, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
        .map_err(|e| NeatError::DeserializationMismatch(e.to_string()))?;
    Ok(pool)
}

fn write_params(out: &mut String, params: &NeatParams) {
    let encoded = bincode::serde::encode_to_vec(params, bincode::config::standard())
        .expect("params are always encodable");
    writeln(out, encoded.len());
    writeln(out, hex_encode(&encoded));
}

fn read_params(lines: &mut std::str::Lines<'_>) -> NeatResult<NeatParams> {
    let len: usize = next_parsed(lines)?;
    let line = lines
        .next()
        .ok_or_else(|| NeatError::DeserializationMismatch("missing params line".into()))?;
    let bytes = hex_decode(line)?;
    if bytes.len() != len {
        return Err(NeatError::DeserializationMismatch(
            "params length mismatch".into(),
        ));
    }
    let (params, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
        .map_err(|e| NeatError::DeserializationMismatch(e.to_string()))?;
    Ok(params)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(text: &str) -> NeatResult<Vec<u8>> {
    if text.len() % 2 != 0 {
        return Err(NeatError::DeserializationMismatch("odd hex length".into()));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|_| NeatError::DeserializationMismatch("invalid hex byte".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genome_text_round_trips() {
        use rand::SeedableRng;

        let params = NeatParams::new(2, 1);
        let mut pool = InnovationPool::new(4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let genome = Genome::seed(2, 1, &mut pool, &mut rng, &params);

        let mut text = String::new();
        write_genome(&mut text, &genome);
        let mut lines = text.lines();
        let round_tripped = read_genome(&mut lines).unwrap();

        assert_eq!(genome.gene_count(), round_tripped.gene_count());
        for gene in genome.genes() {
            let other = round_tripped.get_gene(gene.innov).unwrap();
            assert_eq!(gene.from, other.from);
            assert_eq!(gene.to, other.to);
            assert_eq!(gene.weight, other.weight);
            assert_eq!(gene.enabled, other.enabled);
        }
    }
}
