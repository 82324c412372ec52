//! Line-oriented text form of a [`KDTree`].
//!
//! Nodes are written depth first in pre-order, one block per node:
//!
//! ```text
//! node: <handle>
//! leaf: <0|1>
//! split_dim: <axis>        (internal nodes only)
//! split_coord: <pivot>     (internal nodes only)
//! data:
//! <x0> <x1> ... <index>    (one line per point)
//! ###
//! ```
//!
//! An internal node's block is followed by the block of its negative child, then the block of
//! its positive child. Numbers are printed in their shortest form that parses back to the same
//! value, so a written tree reads back identical.

use std::io::{BufRead, Write};
use std::str::FromStr;

use log::debug;

use crate::error::{KdIndexError, Result};
use crate::kdtree::node::Node;
use crate::kdtree::split::Split;
use crate::kdtree::KDTree;
use crate::point::Point;
use crate::r#type::IndexableNum;

const NODE_LABEL: &str = "node:";
const LEAF_LABEL: &str = "leaf:";
const SPLIT_DIM_LABEL: &str = "split_dim:";
const SPLIT_COORD_LABEL: &str = "split_coord:";
const DATA_LABEL: &str = "data:";
const END_OF_NODE: &str = "###";

impl<N: IndexableNum> KDTree<N> {
    /// Write this tree in its text form. A tree without a root writes nothing.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let mut stack: Vec<&Node<N>> = vec![root];
        while let Some(node) = stack.pop() {
            writeln!(writer, "{} {}", NODE_LABEL, node.handle)?;
            writeln!(writer, "{} {}", LEAF_LABEL, u8::from(node.is_leaf()))?;
            if let Some(split) = &node.split {
                writeln!(writer, "{} {}", SPLIT_DIM_LABEL, split.axis)?;
                writeln!(writer, "{} {}", SPLIT_COORD_LABEL, split.pivot)?;
            }

            writeln!(writer, "{}", DATA_LABEL)?;
            for point in &node.points {
                for coord in point.coords() {
                    write!(writer, "{} ", coord)?;
                }
                writeln!(writer, "{}", point.index())?;
            }
            writeln!(writer, "{}", END_OF_NODE)?;

            if let Some((neg, pos)) = node.children.as_deref() {
                stack.push(pos);
                stack.push(neg);
            }
        }

        writer.flush()?;
        debug!("wrote {} items of a {}-d tree", self.num_items, self.dims);
        Ok(())
    }

    /// The text form of this tree.
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        self.write_to(&mut buf).expect("writing into a Vec<u8> is infallible");
        String::from_utf8(buf).expect("labels and formatted numbers are ASCII")
    }

    /// Read a tree of `dims`-dimensional points from its text form.
    ///
    /// Reading stops right after the last block of the tree; anything following it is left in
    /// the reader. The loaded tree is always a new tree, and keeps the node handles found in
    /// the stream.
    pub fn read_from<R: BufRead>(reader: R, dims: usize) -> Result<Self> {
        assert!(dims > 0, "a tree needs at least one dimension");
        let mut lines = Lines::new(reader);

        // Levels of the blocks still expected, in the order they will appear.
        let mut pending = vec![0usize];
        let mut blocks = vec![];
        while let Some(level) = pending.pop() {
            let block = read_block::<N, _>(&mut lines, dims, level)?;
            if block.split.is_some() {
                pending.push(level + 1);
                pending.push(level + 1);
            }
            blocks.push(block);
        }

        let tree = assemble(blocks, dims, lines.line)?;
        debug!(
            "read {} items of a {}-d tree from {} lines",
            tree.num_items, dims, lines.line
        );
        Ok(tree)
    }

    /// Parse a tree of `dims`-dimensional points from its text form.
    pub fn from_text(text: &str, dims: usize) -> Result<Self> {
        Self::read_from(text.as_bytes(), dims)
    }
}

/// One node block, before its children are attached.
struct Block<N: IndexableNum> {
    handle: u32,
    level: usize,
    split: Option<Split<N>>,
    points: Vec<Point<N>>,
}

/// Line reader tracking the current line number for error messages.
struct Lines<R: BufRead> {
    reader: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line: 0,
        }
    }

    /// The next line without its line terminator.
    fn next_line(&mut self) -> Result<&str> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Err(self.error("unexpected end of stream"));
        }
        self.line += 1;
        Ok(self.buf.trim_end_matches(['\n', '\r']))
    }

    /// Read a `<label> <value>` line.
    fn field<T: FromStr>(&mut self, label: &str) -> Result<T> {
        let line = self.next_line()?;
        let mut tokens = line.split_whitespace();
        let (found, value) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(found), Some(value), None) => (found, value),
            _ => return Err(self.error(format!("expected `{} <value>`", label))),
        };
        if found != label {
            let message = format!("expected `{}`, found `{}`", label, found);
            return Err(self.error(message));
        }
        match value.parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                let message = format!("invalid value `{}` for `{}`", value, label);
                Err(self.error(message))
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> KdIndexError {
        KdIndexError::Format {
            line: self.line,
            message: message.into(),
        }
    }
}

fn read_block<N: IndexableNum, R: BufRead>(
    lines: &mut Lines<R>,
    dims: usize,
    level: usize,
) -> Result<Block<N>> {
    let handle = lines.field::<u32>(NODE_LABEL)?;
    let is_leaf = match lines.field::<u8>(LEAF_LABEL)? {
        0 => false,
        1 => true,
        flag => return Err(lines.error(format!("leaf flag must be 0 or 1, found {}", flag))),
    };

    let split = if is_leaf {
        None
    } else {
        let axis = lines.field::<usize>(SPLIT_DIM_LABEL)?;
        if axis >= dims {
            let message = format!("split axis {} out of range for {} dimensions", axis, dims);
            return Err(lines.error(message));
        }
        let pivot = lines.field::<N>(SPLIT_COORD_LABEL)?;
        Some(Split::new(axis, pivot))
    };

    if lines.next_line()?.trim() != DATA_LABEL {
        return Err(lines.error(format!("expected `{}`", DATA_LABEL)));
    }

    let mut points = vec![];
    loop {
        let line = lines.next_line()?.trim();
        if line == END_OF_NODE {
            break;
        }
        let point = parse_point(line, dims).map_err(|message| lines.error(message))?;
        points.push(point);
    }

    if split.is_some() && !points.is_empty() {
        return Err(lines.error(format!("internal node {} holds points", handle)));
    }

    Ok(Block {
        handle,
        level,
        split,
        points,
    })
}

fn parse_point<N: IndexableNum>(line: &str, dims: usize) -> std::result::Result<Point<N>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != dims + 1 {
        return Err(format!(
            "expected {} coordinates and an index, found {} values",
            dims,
            tokens.len()
        ));
    }

    let (index, coords) = match tokens.split_last() {
        Some(parts) => parts,
        None => return Err("empty point line".to_string()),
    };
    let coords = coords
        .iter()
        .map(|token| {
            token
                .parse::<N>()
                .map_err(|_| format!("invalid coordinate `{}`", token))
        })
        .collect::<std::result::Result<Vec<N>, String>>()?;
    let index = index
        .parse::<u32>()
        .map_err(|_| format!("invalid point index `{}`", index))?;

    Ok(Point::new(coords, index))
}

/// Attach children to their parents. `blocks` is in pre-order, so walking it backwards every
/// internal node finds its negative child on top of the stack and its positive child below.
fn assemble<N: IndexableNum>(blocks: Vec<Block<N>>, dims: usize, line: usize) -> Result<KDTree<N>> {
    let missing_child = || KdIndexError::Format {
        line,
        message: "internal node is missing a child".to_string(),
    };

    let mut num_items = 0;
    let mut max_handle = 0;
    let mut stack: Vec<Node<N>> = vec![];
    for block in blocks.into_iter().rev() {
        num_items += block.points.len();
        max_handle = max_handle.max(block.handle);

        let mut node = Node::new_leaf(block.handle, block.level, block.points);
        if let Some(split) = block.split {
            let neg = stack.pop().ok_or_else(missing_child)?;
            let pos = stack.pop().ok_or_else(missing_child)?;
            node.split = Some(split);
            node.children = Some(Box::new((neg, pos)));
        }
        stack.push(node);
    }

    let root = stack.pop().ok_or_else(missing_child)?;
    Ok(KDTree {
        root: Some(root),
        dims,
        num_items,
        next_handle: max_handle.saturating_add(1),
    })
}
