use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::trace;

use crate::bitstream::read_bits;
use crate::error::{Error, Result};
use crate::frequency::{ALPHABET_SIZE, FrequencyTable};

#[derive(Debug, PartialEq, Eq)]
enum NodeType {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Node {
    node_type: NodeType,
    weight: u64,
}

impl Node {
    fn new_leaf(symbol: u8, weight: u64) -> Self {
        Node {
            node_type: NodeType::Leaf(symbol),
            weight,
        }
    }

    fn new_internal(left: Node, right: Node) -> Self {
        Node {
            weight: left.weight + right.weight,
            node_type: NodeType::Internal(Box::new(left), Box::new(right)),
        }
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf(_))
    }
}

/// Heap entry ordered by `(weight, seq)`, smallest first.
///
/// Leaves take their symbol value as `seq`, merged nodes take
/// `256 + merge index`, so equal weights always pop in the same order.
struct Pending {
    node: Node,
    seq: usize,
}

impl Eq for Pending {}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.node.weight == other.node.weight && self.seq == other.seq
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .node
            .weight
            .cmp(&self.node.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Huffman tree rebuilt from a frequency table on every call.
#[derive(Debug)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Builds the tree by repeatedly merging the two lightest nodes.
    ///
    /// Returns `None` when no symbol has a non-zero count. A table with a
    /// single symbol still yields an internal root: the symbol sits on the
    /// left and a zero-weight padding leaf on the right, so its code is `0`.
    pub fn build(frequencies: &FrequencyTable) -> Option<Self> {
        let mut pqueue = BinaryHeap::new();
        for (symbol, count) in frequencies.iter() {
            pqueue.push(Pending {
                node: Node::new_leaf(symbol, count as u64),
                seq: symbol as usize,
            });
        }

        if pqueue.len() == 1 {
            let only = pqueue.pop().expect("checked with length");
            let &NodeType::Leaf(symbol) = &only.node.node_type else {
                unreachable!("heap holds only leaves before merging");
            };
            let padding = Node::new_leaf(symbol.wrapping_add(1), 0);
            let root = Node::new_internal(only.node, padding);
            return Some(Self { root });
        }

        let mut seq = ALPHABET_SIZE;
        while pqueue.len() > 1 {
            let ln = pqueue.pop().expect("checked with while loop condition");
            let rn = pqueue.pop().expect("checked with while loop condition");

            pqueue.push(Pending {
                node: Node::new_internal(ln.node, rn.node),
                seq,
            });
            seq += 1;
        }

        pqueue.pop().map(|pending| Self { root: pending.node })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Walks the tree from the root for each symbol until `bits` is used up.
    pub fn decode(&self, bits: &[bool]) -> Result<Vec<u8>> {
        self.walk(bits.iter().map(|&bit| Ok(bit)))
    }

    /// Decodes the first `bit_count` digits of a packed payload without
    /// unpacking it into a digit buffer first.
    pub fn decode_payload(&self, payload: &[u8], bit_count: u64) -> Result<Vec<u8>> {
        self.walk(read_bits(payload, bit_count)?)
    }

    fn walk<I>(&self, bits: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = Result<bool>>,
    {
        let mut decoded = Vec::new();
        let mut current_node = &self.root;

        for (pos, bit) in bits.into_iter().enumerate() {
            let bit = bit?;
            let NodeType::Internal(left, right) = &current_node.node_type else {
                unreachable!("walk restarts at the root after every leaf");
            };
            current_node = if bit { &**right } else { &**left };

            if let NodeType::Leaf(symbol) = current_node.node_type {
                if current_node.weight == 0 {
                    return Err(Error::CorruptPayload(format!(
                        "bit {pos} selects symbol {symbol:#04x} which never occurred"
                    )));
                }
                decoded.push(symbol);
                current_node = &self.root;
            }
        }

        if !std::ptr::eq(current_node, &self.root) {
            return Err(Error::CorruptPayload(
                "bit stream ends in the middle of a code".to_string(),
            ));
        }

        Ok(decoded)
    }
}

/// Root-to-leaf path (left = `false`, right = `true`) of every present symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<Vec<bool>>>,
}

impl CodeTable {
    pub fn derive(tree: &Tree) -> Self {
        let mut codes = vec![None; ALPHABET_SIZE];
        fill(&tree.root, &mut Vec::new(), &mut codes);
        let table = Self { codes };
        trace!("code table: {table}");
        table
    }

    pub fn get(&self, symbol: u8) -> Option<&[bool]> {
        self.codes[symbol as usize].as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &[bool])> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.as_deref().map(|code| (symbol as u8, code)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(Option::is_none)
    }

    /// Bits needed to encode data with the given frequencies, or `None` if
    /// some counted symbol has no code.
    pub fn encoded_len(&self, frequencies: &FrequencyTable) -> Option<u64> {
        frequencies.iter().try_fold(0u64, |acc, (symbol, count)| {
            self.get(symbol)
                .map(|code| acc + count as u64 * code.len() as u64)
        })
    }

    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&[bool]> = self.iter().map(|(_, code)| code).collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !b.starts_with(a))
        })
    }

    /// Greedy lookup: grow a candidate until it equals some code, emit, reset.
    ///
    /// Produces the same bytes as [`Tree::decode`]; the tree walk is the
    /// path used by the codec.
    pub fn decode(&self, bits: &[bool]) -> Result<Vec<u8>> {
        let reverse: HashMap<&[bool], u8> =
            self.iter().map(|(symbol, code)| (code, symbol)).collect();
        let longest = self.iter().map(|(_, code)| code.len()).max().unwrap_or(0);

        let mut decoded = Vec::new();
        let mut start = 0;
        for end in 1..=bits.len() {
            let candidate = &bits[start..end];
            if let Some(&symbol) = reverse.get(candidate) {
                decoded.push(symbol);
                start = end;
            } else if candidate.len() >= longest {
                return Err(Error::CorruptPayload(format!(
                    "no code matches the bits starting at {start}"
                )));
            }
        }

        if start != bits.len() {
            return Err(Error::CorruptPayload(
                "bit stream ends in the middle of a code".to_string(),
            ));
        }

        Ok(decoded)
    }
}

impl std::fmt::Display for CodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (symbol, code) in self.iter() {
            let bits: String = code.iter().map(|&bit| if bit { '1' } else { '0' }).collect();
            map.entry(&format_args!("{symbol:#04x}"), &format_args!("{bits}"));
        }
        map.finish()
    }
}

fn fill(node: &Node, path: &mut Vec<bool>, codes: &mut [Option<Vec<bool>>]) {
    match &node.node_type {
        NodeType::Leaf(symbol) => {
            // padding leaf of a single-symbol tree
            if node.weight > 0 {
                codes[*symbol as usize] = Some(path.clone());
            }
        }
        NodeType::Internal(ln, rn) => {
            path.push(false);
            fill(ln, path, codes);
            path.pop();
            path.push(true);
            fill(rn, path, codes);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    fn check_weights(node: &Node) -> u64 {
        match &node.node_type {
            NodeType::Leaf(_) => node.weight,
            NodeType::Internal(ln, rn) => {
                let sum = check_weights(ln) + check_weights(rn);
                assert_eq!(node.weight, sum);
                sum
            }
        }
    }

    #[test]
    fn empty_table_has_no_tree() {
        assert!(Tree::build(&FrequencyTable::default()).is_none());
    }

    #[test]
    fn aaab_gives_a_shorter_code() {
        let freq = FrequencyTable::of(b"aaab");
        let tree = Tree::build(&freq).unwrap();
        assert_eq!(tree.root().weight(), 4);

        let table = CodeTable::derive(&tree);
        let a = table.get(b'a').unwrap();
        let b = table.get(b'b').unwrap();
        assert!(a.len() <= b.len());
        assert_eq!(table.encoded_len(&freq), Some(3 * a.len() as u64 + b.len() as u64));
        // b is lighter, extracted first, so it lands on the left
        assert_eq!(b, bits("0").as_slice());
        assert_eq!(a, bits("1").as_slice());
    }

    #[test]
    fn single_symbol_gets_one_bit_code() {
        let freq = FrequencyTable::of(&[0x41; 1000]);
        let tree = Tree::build(&freq).unwrap();
        assert!(!tree.root().is_leaf());

        let table = CodeTable::derive(&tree);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0x41), Some(bits("0").as_slice()));
        assert_eq!(table.get(0x42), None);
        assert_eq!(tree.decode(&bits("000")).unwrap(), vec![0x41; 3]);
    }

    #[test]
    fn single_symbol_255_pads_with_zero() {
        let freq = FrequencyTable::of(&[0xff, 0xff]);
        let tree = Tree::build(&freq).unwrap();
        let err = tree.decode(&bits("01")).unwrap_err();
        assert!(matches!(err, Error::CorruptPayload(_)));
    }

    #[test]
    fn weights_sum_up_the_tree() {
        let freq = FrequencyTable::of(b"abracadabra alakazam");
        let tree = Tree::build(&freq).unwrap();
        assert_eq!(check_weights(tree.root()), freq.total());
    }

    #[test]
    fn equal_weights_break_ties_by_symbol() {
        let freq = FrequencyTable::of(b"dcba");
        let first = CodeTable::derive(&Tree::build(&freq).unwrap());
        let second = CodeTable::derive(&Tree::build(&freq).unwrap());
        assert_eq!(first, second);
        // a and b merge first, then c and d, then the two pairs
        assert_eq!(first.get(b'a'), Some(bits("00").as_slice()));
        assert_eq!(first.get(b'b'), Some(bits("01").as_slice()));
        assert_eq!(first.get(b'c'), Some(bits("10").as_slice()));
        assert_eq!(first.get(b'd'), Some(bits("11").as_slice()));
    }

    #[test]
    fn all_symbols_are_prefix_free() {
        let data: Vec<u8> = (0..=255u8).chain(0..=10).chain(0..=3).collect();
        let freq = FrequencyTable::of(&data);
        let table = CodeTable::derive(&Tree::build(&freq).unwrap());
        assert_eq!(table.len(), 256);
        assert!(table.is_prefix_free());
    }

    #[test]
    fn walk_and_lookup_agree() {
        let data = b"mississippi river";
        let freq = FrequencyTable::of(data);
        let tree = Tree::build(&freq).unwrap();
        let table = CodeTable::derive(&tree);

        let encoded: Vec<bool> = data
            .iter()
            .flat_map(|&b| table.get(b).unwrap().to_vec())
            .collect();

        assert_eq!(tree.decode(&encoded).unwrap(), data.to_vec());
        assert_eq!(table.decode(&encoded).unwrap(), data.to_vec());
    }

    #[test]
    fn payload_walk_matches_digit_walk() {
        let data = b"she sells sea shells";
        let freq = FrequencyTable::of(data);
        let tree = Tree::build(&freq).unwrap();
        let codes = CodeTable::derive(&tree);
        let (payload, bit_count) = crate::bitstream::pack(data, &codes);

        assert_eq!(tree.decode_payload(&payload, bit_count).unwrap(), data.to_vec());
        let digits = crate::bitstream::unpack(&payload, bit_count).unwrap();
        assert_eq!(tree.decode(&digits).unwrap(), data.to_vec());
        assert!(matches!(
            tree.decode_payload(&payload[..payload.len() - 1], bit_count),
            Err(Error::CorruptPayload(_))
        ));
    }

    #[test]
    fn truncated_code_is_rejected() {
        let freq = FrequencyTable::of(b"abcc");
        let tree = Tree::build(&freq).unwrap();
        let table = CodeTable::derive(&tree);
        let a = table.get(b'a').unwrap();
        assert_eq!(a.len(), 2);

        let partial = &a[..1];
        assert!(matches!(tree.decode(partial), Err(Error::CorruptPayload(_))));
        assert!(matches!(table.decode(partial), Err(Error::CorruptPayload(_))));
    }
}
