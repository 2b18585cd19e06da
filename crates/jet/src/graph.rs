//! Ordered sets of image positions at which jets are extracted.

use gabor_record::RecordStore;
use ndarray::{Array2, ArrayView3};
use num_complex::Complex64;

use crate::error::JetError;
use crate::jet::Jet;

/// Ordered list of `(row, col)` node positions.
///
/// The node order is part of the stored format: jets extracted with
/// [`extract`](Self::extract) follow it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: Vec<[i32; 2]>,
}

impl Graph {
    /// Regular grid from `first` to `last` (inclusive where the step lands
    /// on it) in row-major order. Each axis holds `(last - first) / step + 1`
    /// nodes.
    ///
    /// # Errors
    ///
    /// [`JetError::InvalidArgument`] for a non-positive step or
    /// `last < first` on either axis.
    ///
    /// # Example
    ///
    /// ```
    /// use gabor_jet::Graph;
    ///
    /// let graph = Graph::grid([10, 10], [105, 60], [20, 10]).unwrap();
    /// assert_eq!(graph.number_of_nodes(), 30);
    /// assert_eq!(graph.nodes()[0], [10, 10]);
    /// assert_eq!(graph.nodes()[29], [90, 60]);
    /// ```
    pub fn grid(first: [i32; 2], last: [i32; 2], step: [i32; 2]) -> Result<Self, JetError> {
        for axis in 0..2 {
            if step[axis] <= 0 {
                return Err(JetError::InvalidArgument(format!(
                    "grid step must be positive, got {step:?}"
                )));
            }
            if last[axis] < first[axis] {
                return Err(JetError::InvalidArgument(format!(
                    "grid end {last:?} lies before start {first:?}"
                )));
            }
        }
        // i64 keeps the extent of any i32 range; every node lies in [first, last]
        let axis_nodes = |axis: usize| -> Vec<i32> {
            let (first, last, step) = (
                i64::from(first[axis]),
                i64::from(last[axis]),
                i64::from(step[axis]),
            );
            (0..=(last - first) / step)
                .filter_map(|i| i32::try_from(first + i * step).ok())
                .collect()
        };
        let (rows, cols) = (axis_nodes(0), axis_nodes(1));

        let mut nodes = Vec::with_capacity(rows.len() * cols.len());
        for &r in &rows {
            for &c in &cols {
                nodes.push([r, c]);
            }
        }
        Ok(Self { nodes })
    }

    /// Lattice aligned to two anchor points, e.g. the eye centres of a face.
    ///
    /// The lattice axis runs from `anchor1` to `anchor2`, with `between`
    /// nodes between the anchors and `along` extra nodes beyond each anchor.
    /// Perpendicular to it there are `above` rows on one side and `below` rows
    /// on the other, all with the anchor spacing. Nodes are listed row by
    /// row; coordinates are rounded to the nearest pixel.
    ///
    /// # Errors
    ///
    /// [`JetError::InvalidArgument`] if both anchors coincide.
    pub fn anchored(
        anchor1: [i32; 2],
        anchor2: [i32; 2],
        between: usize,
        along: usize,
        above: usize,
        below: usize,
    ) -> Result<Self, JetError> {
        if anchor1 == anchor2 {
            return Err(JetError::InvalidArgument(format!(
                "anchors must differ, both are {anchor1:?}"
            )));
        }
        let spacing = (between + 1) as f64;
        let step_y = f64::from(anchor2[0] - anchor1[0]) / spacing;
        let step_x = f64::from(anchor2[1] - anchor1[1]) / spacing;

        let (along, above) = (along as f64, above as f64);
        let start_y = f64::from(anchor1[0]) - along * step_y - above * step_x;
        let start_x = f64::from(anchor1[1]) - along * step_x + above * step_y;

        let cols = between + 2 * (along as usize + 1);
        let rows = above as usize + below + 1;
        let mut nodes = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let r = r as f64;
            for c in 0..cols {
                let c = c as f64;
                nodes.push([
                    (start_y + r * step_x + c * step_y).round() as i32,
                    (start_x + c * step_x - r * step_y).round() as i32,
                ]);
            }
        }
        Ok(Self { nodes })
    }

    /// Graph with the given node positions.
    pub fn from_nodes(nodes: Vec<[i32; 2]>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[[i32; 2]] {
        &self.nodes
    }

    /// Replaces all node positions.
    pub fn set_nodes(&mut self, nodes: Vec<[i32; 2]>) {
        self.nodes = nodes;
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Fills `jets` with the (unnormalised) jets at the node positions.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | `jets.len()` differs from the node count | [`JetError::LengthMismatch`] |
    /// | a node lies outside the trafo image | [`JetError::OutOfRange`] |
    pub fn extract(
        &self,
        trafo_image: ArrayView3<'_, Complex64>,
        jets: &mut [Jet],
    ) -> Result<(), JetError> {
        if jets.len() != self.nodes.len() {
            return Err(JetError::LengthMismatch {
                expected: self.nodes.len(),
                got: jets.len(),
            });
        }
        for (jet, &node) in jets.iter_mut().zip(&self.nodes) {
            jet.extract(trafo_image.view(), node, false)?;
        }
        Ok(())
    }

    /// Extracts one freshly allocated jet per node.
    ///
    /// # Errors
    ///
    /// [`JetError::OutOfRange`] for nodes outside the trafo image and
    /// [`JetError::DivideByZero`] when normalising an all-zero jet.
    pub fn extract_jets(
        &self,
        trafo_image: ArrayView3<'_, Complex64>,
        normalize: bool,
    ) -> Result<Vec<Jet>, JetError> {
        self.nodes
            .iter()
            .map(|&node| Jet::from_trafo_image(trafo_image.view(), node, normalize))
            .collect()
    }

    /// Writes the nodes as an `N × 2` `NodePositions` array.
    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), JetError> {
        let positions = Array2::from_shape_fn((self.nodes.len(), 2), |(n, axis)| {
            i64::from(self.nodes[n][axis])
        });
        store.set_int_array2("NodePositions", positions.view())?;
        Ok(())
    }

    /// Reads a graph written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Record errors, and [`JetError::InvalidArgument`] for positions that do
    /// not have two columns or do not fit into `i32`.
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, JetError> {
        let positions = store.read_int_array2("NodePositions")?;
        if positions.ncols() != 2 {
            return Err(JetError::InvalidArgument(format!(
                "NodePositions must have 2 columns, got {}",
                positions.ncols()
            )));
        }
        let to_coordinate = |value: i64| {
            i32::try_from(value)
                .map_err(|_| JetError::InvalidArgument(format!("node coordinate {value} too large")))
        };
        let nodes = positions
            .rows()
            .into_iter()
            .map(|row| Ok([to_coordinate(row[0])?, to_coordinate(row[1])?]))
            .collect::<Result<Vec<_>, JetError>>()?;
        Ok(Self { nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gabor_record::MemoryRecord;
    use ndarray::Array3;

    #[test]
    fn grid_row_major_order() {
        let graph = Graph::grid([0, 0], [2, 4], [2, 2]).unwrap();
        assert_eq!(
            graph.nodes(),
            &[[0, 0], [0, 2], [0, 4], [2, 0], [2, 2], [2, 4]]
        );
    }

    #[test]
    fn grid_skips_partial_step() {
        let graph = Graph::grid([1, 1], [4, 1], [2, 5]).unwrap();
        assert_eq!(graph.nodes(), &[[1, 1], [3, 1]]);
    }

    #[test]
    fn grid_rejects_bad_parameters() {
        assert!(Graph::grid([0, 0], [4, 4], [0, 1]).is_err());
        assert!(Graph::grid([0, 0], [4, 4], [1, -1]).is_err());
        assert!(Graph::grid([5, 0], [4, 4], [1, 1]).is_err());
    }

    #[test]
    fn grid_spans_the_full_coordinate_range() {
        let graph = Graph::grid([i32::MIN, 0], [i32::MAX, 0], [i32::MAX, 1]).unwrap();
        assert_eq!(
            graph.nodes(),
            &[[i32::MIN, 0], [-1, 0], [i32::MAX - 1, 0]]
        );
    }

    #[test]
    fn anchored_horizontal_anchors() {
        // anchors on one row, two nodes apart, one row above and below
        let graph = Graph::anchored([10, 10], [10, 14], 1, 0, 1, 1).unwrap();
        assert_eq!(graph.number_of_nodes(), 9);
        assert_eq!(graph.nodes()[0], [8, 10]);
        assert_eq!(graph.nodes()[3], [10, 10]);
        assert_eq!(graph.nodes()[4], [10, 12]);
        assert_eq!(graph.nodes()[5], [10, 14]);
        assert_eq!(graph.nodes()[8], [12, 14]);
    }

    #[test]
    fn anchored_rejects_identical_anchors() {
        assert!(matches!(
            Graph::anchored([3, 3], [3, 3], 1, 1, 1, 1),
            Err(JetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn set_nodes_replaces() {
        let mut graph = Graph::from_nodes(vec![[1, 2]]);
        graph.set_nodes(vec![[3, 4], [5, 6]]);
        assert_eq!(graph.nodes(), &[[3, 4], [5, 6]]);
    }

    #[test]
    fn extract_checks_jet_count() {
        let graph = Graph::from_nodes(vec![[0, 0], [1, 1]]);
        let stack = Array3::<Complex64>::zeros((3, 2, 2));
        let mut jets = vec![Jet::zeros(3)];
        assert!(matches!(
            graph.extract(stack.view(), &mut jets),
            Err(JetError::LengthMismatch {
                expected: 2,
                got: 1
            })
        ));
        assert!(matches!(
            graph.extract(stack.view(), &mut []),
            Err(JetError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn record_round_trip() {
        let graph = Graph::from_nodes(vec![[1, -2], [300, 4], [0, 0]]);
        let mut store = MemoryRecord::new();
        graph.save(&mut store).unwrap();
        assert_eq!(Graph::load(&store).unwrap(), graph);
    }

    #[test]
    fn empty_graph_round_trip() {
        let mut store = MemoryRecord::new();
        Graph::default().save(&mut store).unwrap();
        assert_eq!(Graph::load(&store).unwrap().number_of_nodes(), 0);
    }
}
