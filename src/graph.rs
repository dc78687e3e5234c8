// K-mer de Bruijn assembly graph over a reference slice and read segments.
//
// The graph is an arena: vertex and edge tables plus per-vertex adjacency
// lists, so vertex identity follows insertion order and the borrow checker
// never sees a self-referencing structure. K-mers are stored by value.
// Consecutive vertices along any walk differ by a one-base right-shift, so
// out-edges of a vertex are distinguished by the last base of their target.

use crate::error::Result;
use crate::haplotype::Haplotype;
use crate::sw::{self, SwParameters};
use ahash::{AHashMap, AHashSet};
use std::io::{self, Write};

/// Haplotypes kept per window after score ordering.
pub const DEFAULT_NUM_PATHS: usize = 128;
/// Edges below this support are pruned unless they are reference edges or
/// their source has a single out-edge.
pub const PRUNE_FACTOR: usize = 2;

type VertexId = usize;
type EdgeId = usize;

#[derive(Debug)]
struct VertexData {
    kmer: Box<[u8]>,
}

#[derive(Debug)]
struct EdgeData {
    source: VertexId,
    target: VertexId,
    count: usize,
    is_ref: bool,
    is_on_path: bool,
    score: f64,
}

#[derive(Debug, Default)]
pub struct AssemblyGraph {
    kmer_size: usize,
    vertices: Vec<VertexData>,
    edges: Vec<EdgeData>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    source: VertexId,
    sink: VertexId,
    /// K-mers seen more than once within any single input sequence; these
    /// always get fresh vertices.
    dup_kmers: AHashSet<Box<[u8]>>,
    /// K-mer -> vertex index for k-mers that are not duplicates.
    unique_kmers: AHashMap<Box<[u8]>, VertexId>,
    paths: Vec<Vec<VertexId>>,
}

impl AssemblyGraph {
    pub fn new(kmer_size: usize) -> Self {
        AssemblyGraph {
            kmer_size,
            ..AssemblyGraph::default()
        }
    }

    pub fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    pub fn unique_kmer_count(&self) -> usize {
        self.unique_kmers.len()
    }

    /// First reference k-mer.
    pub fn source_kmer(&self) -> &[u8] {
        &self.vertices[self.source].kmer
    }

    /// Last reference k-mer.
    pub fn sink_kmer(&self) -> &[u8] {
        &self.vertices[self.sink].kmer
    }

    /// Thread the reference and every read segment through the graph. The
    /// reference goes first and fixes the source and sink vertices. Every
    /// segment must be at least `kmer_size` long.
    pub fn build(&mut self, reference: &[u8], segments: &[&[u8]]) {
        self.note_duplicate_kmers(reference);
        for segment in segments {
            self.note_duplicate_kmers(segment);
        }

        self.add_sequence(reference, true);
        for segment in segments {
            self.add_sequence(segment, false);
        }
    }

    fn note_duplicate_kmers(&mut self, seq: &[u8]) {
        let k = self.kmer_size;
        if seq.len() < k {
            return;
        }
        let mut seen: AHashSet<&[u8]> = AHashSet::new();
        for i in 0..=seq.len() - k {
            let kmer = &seq[i..i + k];
            if !seen.insert(kmer) {
                self.dup_kmers.insert(kmer.into());
            }
        }
    }

    fn create_vertex(&mut self, kmer: &[u8]) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(VertexData { kmer: kmer.into() });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        if !self.dup_kmers.contains(kmer) {
            self.unique_kmers.insert(kmer.into(), id);
        }
        id
    }

    fn get_or_create_vertex(&mut self, kmer: &[u8]) -> VertexId {
        match self.unique_kmers.get(kmer) {
            Some(&v) => v,
            None => self.create_vertex(kmer),
        }
    }

    fn create_edge(&mut self, u: VertexId, v: VertexId, is_ref: bool) {
        let id = self.edges.len();
        self.edges.push(EdgeData {
            source: u,
            target: v,
            count: 1,
            is_ref,
            is_on_path: false,
            score: f64::MIN,
        });
        self.out_edges[u].push(id);
        self.in_edges[v].push(id);
    }

    fn last_base(&self, v: VertexId) -> u8 {
        self.vertices[v].kmer[self.kmer_size - 1]
    }

    /// Walk backward from `v` along single-in-edge predecessors while their
    /// last bases keep matching the leading k-mer, incrementing support.
    /// This credits the K-1 bases before a segment's first full k-mer.
    fn increase_counts_backwards(&mut self, start: VertexId, kmer: &[u8]) {
        let mut v = start;
        let mut len = kmer.len();
        while len > 0 {
            if self.in_edges[v].len() != 1 {
                return;
            }
            let e = self.in_edges[v][0];
            let u = self.edges[e].source;
            if self.last_base(u) != kmer[len - 1] {
                return;
            }
            self.edges[e].count += 1;
            v = u;
            len -= 1;
        }
    }

    /// Advance one base: reuse the out-edge whose target ends in the new
    /// base, or grow the graph with a fresh vertex and edge.
    fn extend_chain(&mut self, u: VertexId, kmer: &[u8], is_ref: bool) -> VertexId {
        let next_base = kmer[self.kmer_size - 1];
        let existing = self.out_edges[u]
            .iter()
            .map(|&e| (e, self.edges[e].target))
            .find(|&(_, t)| self.last_base(t) == next_base);
        if let Some((e, t)) = existing {
            self.edges[e].count += 1;
            return t;
        }

        let v = self.get_or_create_vertex(kmer);
        self.create_edge(u, v, is_ref);
        v
    }

    fn add_sequence(&mut self, seq: &[u8], is_ref: bool) {
        let k = self.kmer_size;
        let mut v = self.get_or_create_vertex(&seq[..k]);
        self.increase_counts_backwards(v, &seq[..k - 1]);
        if is_ref {
            self.source = v;
        }
        for i in 1..=seq.len() - k {
            v = self.extend_chain(v, &seq[i..i + k], is_ref);
        }
        if is_ref {
            self.sink = v;
        }
    }

    /// Pruning filter: reference edges, well-supported edges, and sole
    /// out-edges survive.
    fn edge_admitted(&self, e: EdgeId) -> bool {
        let edge = &self.edges[e];
        edge.is_ref || edge.count >= PRUNE_FACTOR || self.out_edges[edge.source].len() == 1
    }

    /// Depth-first search over the pruned graph from every vertex; a back
    /// edge means a cycle.
    pub fn has_cycles(&self) -> bool {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        fn visit(graph: &AssemblyGraph, v: VertexId, color: &mut [u8]) -> bool {
            color[v] = GRAY;
            for &e in &graph.out_edges[v] {
                if !graph.edge_admitted(e) {
                    continue;
                }
                let t = graph.edges[e].target;
                match color[t] {
                    GRAY => return true,
                    WHITE => {
                        if visit(graph, t, color) {
                            return true;
                        }
                    }
                    _ => {}
                }
            }
            color[v] = BLACK;
            false
        }

        let mut color = vec![WHITE; self.vertices.len()];
        for v in 0..self.vertices.len() {
            if color[v] == WHITE && visit(self, v, &mut color) {
                return true;
            }
        }
        false
    }

    fn enumerate_paths(&self, from: VertexId, to: VertexId, path: &mut Vec<VertexId>, paths: &mut Vec<Vec<VertexId>>) {
        path.push(from);
        if from == to {
            paths.push(path.clone());
        } else {
            for &e in &self.out_edges[from] {
                if !self.edge_admitted(e) {
                    continue;
                }
                let t = self.edges[e].target;
                if !path.contains(&t) {
                    self.enumerate_paths(t, to, path, paths);
                }
            }
        }
        path.pop();
    }

    fn edge_between(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.out_edges[u]
            .iter()
            .copied()
            .find(|&e| self.edges[e].target == v)
    }

    fn mark_edges_on_paths(&mut self) {
        for path_index in 0..self.paths.len() {
            for i in 1..self.paths[path_index].len() {
                let u = self.paths[path_index][i - 1];
                let v = self.paths[path_index][i];
                if let Some(e) = self.edge_between(u, v) {
                    self.edges[e].is_on_path = true;
                }
            }
        }
    }

    /// Per vertex, the on-path out-edges split the vertex's support:
    /// each gets log10(count / total on-path count).
    fn compute_edge_scores(&mut self) {
        let mut on_path_vertices: AHashSet<VertexId> = AHashSet::new();
        for path in &self.paths {
            on_path_vertices.extend(path.iter().copied());
        }

        for &v in &on_path_vertices {
            let edges: Vec<EdgeId> = self.out_edges[v]
                .iter()
                .copied()
                .filter(|&e| self.edges[e].is_on_path)
                .collect();
            let total: usize = edges.iter().map(|&e| self.edges[e].count).sum();
            for e in edges {
                self.edges[e].score = (self.edges[e].count as f64 / total as f64).log10();
            }
        }
    }

    fn extract_haplotypes(&self, reference: &[u8]) -> Result<Vec<Haplotype>> {
        let mut haplotypes = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let mut seq = self.vertices[path[0]].kmer.to_vec();
            let mut score = 0.0;
            for i in 1..path.len() {
                let v = path[i];
                seq.push(self.last_base(v));
                if let Some(e) = self.edge_between(path[i - 1], v) {
                    score += self.edges[e].score;
                }
            }
            haplotypes.push(Haplotype::new(seq, score));
        }

        haplotypes.sort_by(|h1, h2| h2.score.total_cmp(&h1.score));
        haplotypes.truncate(DEFAULT_NUM_PATHS);

        if haplotypes.len() > 1 {
            log::info!("Found {} candidate haplotypes", haplotypes.len());
        } else {
            log::info!("Found only the reference haplotype in the assembly graph");
        }

        for haplotype in &mut haplotypes {
            let (alignment_begin, cigar) =
                sw::align(reference, &haplotype.bases, SwParameters::NEW_SW_PARAMETERS)?;
            haplotype.alignment_begin_wrt_ref = alignment_begin;
            haplotype.cigar = cigar;
        }

        Ok(haplotypes)
    }

    /// Graphviz rendering for debugging: reference edges red, edges below
    /// the prune threshold dotted grey, entry vertices labelled with their
    /// full k-mer and interior ones with their last base.
    pub fn write_dot(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "digraph assembly_graph {{")?;
        for edge in &self.edges {
            if edge.is_ref {
                writeln!(
                    out,
                    "    {} -> {} [label={},color=red];",
                    edge.source, edge.target, edge.count
                )?;
            } else if edge.count < PRUNE_FACTOR {
                writeln!(
                    out,
                    "    {} -> {} [label={},style=dotted,color=grey];",
                    edge.source, edge.target, edge.count
                )?;
            } else {
                writeln!(
                    out,
                    "    {} -> {} [label={}];",
                    edge.source, edge.target, edge.count
                )?;
            }
        }
        for (v, vertex) in self.vertices.iter().enumerate() {
            if self.in_edges[v].is_empty() {
                writeln!(
                    out,
                    "    {} [label={},shape=box];",
                    v,
                    String::from_utf8_lossy(&vertex.kmer)
                )?;
            } else {
                writeln!(
                    out,
                    "    {} [label={},shape=box];",
                    v,
                    self.last_base(v) as char
                )?;
            }
        }
        writeln!(out, "}}")
    }

    /// Enumerate all simple source-to-sink paths through the pruning filter
    /// and turn them into scored, reference-aligned haplotypes.
    pub fn find_paths(&mut self, reference: &[u8]) -> Result<Vec<Haplotype>> {
        let mut path = Vec::new();
        let mut paths = Vec::new();
        self.enumerate_paths(self.source, self.sink, &mut path, &mut paths);
        self.paths = paths;

        self.mark_edges_on_paths();
        self.compute_edge_scores();
        self.extract_haplotypes(reference)
    }
}
