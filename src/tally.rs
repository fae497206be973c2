use std::collections::HashMap;

/// Address to hit count, iterated in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more hit for `address`.
    pub fn record(mut self, address: String) -> Self {
        match self.index.get(&address) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(address.clone(), self.entries.len());
                self.entries.push((address, 1));
            }
        }
        self
    }

    pub fn get(&self, address: &str) -> Option<u64> {
        self.index.get(address).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts; equals the number of addresses folded in.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(a, n)| (a.as_str(), *n))
    }
}

impl<S: Into<String>> FromIterator<S> for CountTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        tally(iter)
    }
}

pub fn tally<I, S>(addresses: I) -> CountTable
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    addresses
        .into_iter()
        .fold(CountTable::new(), |table, a| table.record(a.into()))
}

/// Like [`tally`], but stops at the first error in the stream.
pub fn try_tally<I, E>(addresses: I) -> Result<CountTable, E>
where
    I: IntoIterator<Item = Result<String, E>>,
{
    addresses
        .into_iter()
        .try_fold(CountTable::new(), |table, a| Ok(table.record(a?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_table() {
        let t = tally(Vec::<String>::new());
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.total(), 0);
        assert_eq!(t.iter().count(), 0);
    }

    #[test]
    fn counts_in_first_seen_order() {
        let t = tally([
            "10.0.0.2", "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.2",
        ]);
        let got: Vec<_> = t.iter().collect();
        assert_eq!(
            got,
            vec![("10.0.0.2", 3), ("10.0.0.1", 1), ("10.0.0.3", 1)]
        );
        assert_eq!(t.get("10.0.0.2"), Some(3));
        assert_eq!(t.get("10.0.0.9"), None);
    }

    #[test]
    fn total_equals_input_length() {
        let inputs: &[&[&str]] = &[
            &[],
            &["a"],
            &["a", "a", "a"],
            &["a", "b", "c", "b", "a", "a", "d"],
        ];
        for input in inputs {
            let t: CountTable = input.iter().copied().collect();
            assert_eq!(t.total(), input.len() as u64, "{input:?}");
            assert_eq!(
                t.iter().map(|(_, n)| n).sum::<u64>(),
                input.len() as u64
            );
        }
    }

    #[test]
    fn try_tally_stops_at_first_error() {
        let ok: Vec<Result<String, &str>> =
            vec![Ok("a".into()), Ok("b".into()), Ok("a".into())];
        assert_eq!(try_tally(ok).unwrap().get("a"), Some(2));

        let failing: Vec<Result<String, &str>> =
            vec![Ok("a".into()), Err("boom"), Ok("a".into())];
        assert_eq!(try_tally(failing), Err("boom"));
    }
}
