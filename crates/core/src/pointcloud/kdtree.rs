//! A k-d tree index over a selection of [`Dataset`](super::Dataset) columns.

use std::sync::Mutex;

use kiddo::{KdTree, SquaredEuclidean};

use crate::error::{Error, Result};
use crate::pointcloud::dataset::Dataset;

/// One neighbor result: the row index in the source dataset and its squared
/// distance to the query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: u64,
    pub distance2: f64,
}

enum Tree {
    Two(KdTree<f64, 2>),
    Three(KdTree<f64, 3>),
}

/// A k-d tree built over a fixed set of dataset columns (2 or 3 of them),
/// metric = squared Euclidean distance.
pub struct Query {
    columns: Vec<String>,
    tree: Tree,
    dynamic: bool,
    len: u64,
}

impl Query {
    /// Build an index over `columns` (length 2 or 3) taken from `dataset`.
    pub fn build(dataset: &Dataset, columns: &[&str], dynamic: bool) -> Result<Self> {
        let columns: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
        let mut tree = match columns.len() {
            2 => Tree::Two(KdTree::new()),
            3 => Tree::Three(KdTree::new()),
            n => {
                return Err(Error::Value(format!(
                    "k-d tree query supports 2 or 3 columns, got {n}"
                )))
            }
        };
        let cols: Result<Vec<Vec<f64>>> = columns.iter().map(|c| dataset.get(c)?.as_f64()).collect();
        let cols = cols?;
        let n = dataset.size_major();
        for i in 0..n {
            match &mut tree {
                Tree::Two(t) => t.add(&[cols[0][i], cols[1][i]], i as u64),
                Tree::Three(t) => t.add(&[cols[0][i], cols[1][i], cols[2][i]], i as u64),
            }
        }
        Ok(Self {
            columns,
            tree,
            dynamic,
            len: n as u64,
        })
    }

    /// Whether this query is registered to extend on `Dataset::append` (see
    /// [`Query::extend`]) rather than require a full rebuild.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Append new rows (e.g. after `Dataset::append`) without discarding the
    /// existing index. Only meaningful when `dynamic` was set at `build`.
    pub fn extend(&mut self, dataset: &Dataset) -> Result<()> {
        let cols: Result<Vec<Vec<f64>>> = self
            .columns
            .iter()
            .map(|c| dataset.get(c)?.as_f64())
            .collect();
        let cols = cols?;
        let total = cols[0].len() as u64;
        for i in self.len..total {
            let i = i as usize;
            match &mut self.tree {
                Tree::Two(t) => t.add(&[cols[0][i], cols[1][i]], i as u64),
                Tree::Three(t) => t.add(&[cols[0][i], cols[1][i], cols[2][i]], i as u64),
            }
        }
        self.len = total;
        Ok(())
    }

    /// `k` nearest neighbors of `point` (length must match the column selection).
    pub fn knn(&self, k: usize, point: &[f64]) -> Result<Vec<Neighbor>> {
        match &self.tree {
            Tree::Two(t) => {
                let p: [f64; 2] = point.try_into().map_err(|_| dim_err(2, point.len()))?;
                Ok(t.nearest_n::<SquaredEuclidean>(&p, k)
                    .into_iter()
                    .map(|n| Neighbor {
                        index: n.item,
                        distance2: n.distance,
                    })
                    .collect())
            }
            Tree::Three(t) => {
                let p: [f64; 3] = point.try_into().map_err(|_| dim_err(3, point.len()))?;
                Ok(t.nearest_n::<SquaredEuclidean>(&p, k)
                    .into_iter()
                    .map(|n| Neighbor {
                        index: n.item,
                        distance2: n.distance,
                    })
                    .collect())
            }
        }
    }

    /// All points within squared distance `r2` of `point`.
    pub fn radius(&self, r2: f64, point: &[f64]) -> Result<Vec<Neighbor>> {
        match &self.tree {
            Tree::Two(t) => {
                let p: [f64; 2] = point.try_into().map_err(|_| dim_err(2, point.len()))?;
                Ok(t.within::<SquaredEuclidean>(&p, r2)
                    .into_iter()
                    .map(|n| Neighbor {
                        index: n.item,
                        distance2: n.distance,
                    })
                    .collect())
            }
            Tree::Three(t) => {
                let p: [f64; 3] = point.try_into().map_err(|_| dim_err(3, point.len()))?;
                Ok(t.within::<SquaredEuclidean>(&p, r2)
                    .into_iter()
                    .map(|n| Neighbor {
                        index: n.item,
                        distance2: n.distance,
                    })
                    .collect())
            }
        }
    }
}

fn dim_err(expect: usize, got: usize) -> Error {
    Error::Value(format!("query point has {got} coordinates, expected {expect}"))
}

/// A key identifying a cached [`Query`]: the selected columns and whether it
/// is registered dynamic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct QueryKey {
    columns: Vec<String>,
    dynamic: bool,
}

/// Memoizes [`Query`] instances by `(selection, dynamic)`, building each only
/// once per distinct key.
#[derive(Default)]
pub struct MultiQuery {
    queries: Mutex<Vec<(QueryKey, Query)>>,
}

impl MultiQuery {
    pub fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Run `knn` against the query for `columns`/`dynamic`, building and
    /// caching it on first use.
    pub fn knn(
        &self,
        dataset: &Dataset,
        columns: &[&str],
        dynamic: bool,
        k: usize,
        point: &[f64],
    ) -> Result<Vec<Neighbor>> {
        self.with_query(dataset, columns, dynamic, |q| q.knn(k, point))
    }

    /// Run `radius` against the query for `columns`/`dynamic`, building and
    /// caching it on first use.
    pub fn radius(
        &self,
        dataset: &Dataset,
        columns: &[&str],
        dynamic: bool,
        r2: f64,
        point: &[f64],
    ) -> Result<Vec<Neighbor>> {
        self.with_query(dataset, columns, dynamic, |q| q.radius(r2, point))
    }

    fn with_query<R>(
        &self,
        dataset: &Dataset,
        columns: &[&str],
        dynamic: bool,
        f: impl FnOnce(&Query) -> Result<R>,
    ) -> Result<R> {
        let key = QueryKey {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            dynamic,
        };
        {
            let mut queries = self.queries.lock().unwrap();
            if let Some((_, q)) = queries.iter_mut().find(|(k, _)| *k == key) {
                if dynamic {
                    q.extend(dataset)?;
                }
                return f(q);
            }
        }
        let query = Query::build(dataset, columns, dynamic)?;
        let mut queries = self.queries.lock().unwrap();
        queries.push((key, query));
        let (_, q) = queries.last().unwrap();
        f(q)
    }
}
