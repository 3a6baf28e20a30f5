use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// FrequencyCounter struct
/// A multiset over terms.
/// Counts only ever grow: there is no way to subtract from a term.
/// Iteration follows first-insertion order.
///
/// # Examples
/// ```
/// use ngram_pair_features::FrequencyCounter;
/// let mut counter = FrequencyCounter::new();
/// counter.inc("cats");
/// counter.add("mice", 2);
/// counter.inc("cats");
///
/// assert_eq!(counter.count("cats"), 2);
/// assert_eq!(counter.count("dogs"), 0);
/// assert_eq!(counter.total(), 4);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FrequencyCounter {
    term_count: IndexMap<String, u64, RandomState>,
    total_count: u64,
}

/// Implementation for adding terms
impl FrequencyCounter {
    /// Create a new FrequencyCounter
    pub fn new() -> Self {
        FrequencyCounter {
            term_count: IndexMap::with_hasher(RandomState::new()),
            total_count: 0,
        }
    }

    /// Add `amount` occurrences of a term
    ///
    /// # Arguments
    /// * `term` - term to add
    /// * `amount` - number of occurrences
    #[inline]
    pub fn add(&mut self, term: &str, amount: u64) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += amount;
        } else {
            self.term_count.insert(term.to_string(), amount);
        }
        self.total_count += amount;
        self
    }

    /// Add one occurrence of a term
    #[inline]
    pub fn inc(&mut self, term: &str) -> &mut Self {
        self.add(term, 1)
    }

    /// Add one occurrence of each term
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.inc(term.as_ref());
        }
        self
    }

    /// Sum the counts of another counter into this one
    pub fn merge_from(&mut self, other: &FrequencyCounter) -> &mut Self {
        for (term, &count) in &other.term_count {
            self.add(term, count);
        }
        self
    }

    /// Commutative merge: counts of `a` and `b` summed per term.
    /// Taking ownership lets the bigger side be reused.
    pub fn merge(a: FrequencyCounter, b: FrequencyCounter) -> FrequencyCounter {
        let (mut big, small) = if a.distinct() >= b.distinct() { (a, b) } else { (b, a) };
        big.merge_from(&small);
        big
    }
}

impl<T> From<&[T]> for FrequencyCounter
where
    T: AsRef<str>,
{
    fn from(terms: &[T]) -> Self {
        let mut counter = FrequencyCounter::new();
        counter.add_terms(terms);
        counter
    }
}

impl<S> FromIterator<(S, u64)> for FrequencyCounter
where
    S: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for (term, count) in iter {
            counter.add(term.as_ref(), count);
        }
        counter
    }
}

/// Implementation for retrieving information from FrequencyCounter
impl FrequencyCounter {
    /// Iterator over all terms and their counts, in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Iterator over all terms
    #[inline]
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_count.keys().map(|term| term.as_str())
    }

    /// Occurrence count of a term, 0 if absent
    #[inline]
    pub fn count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Number of distinct terms
    #[inline]
    pub fn distinct(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    /// Sum of all counts
    #[inline]
    pub fn total(&self) -> u64 {
        self.total_count
    }

    /// Terms sorted by descending count, ties by ascending term
    pub fn sorted_frequency_vector(&self) -> Vec<(&str, u64)> {
        let mut term_list: Vec<(&str, u64)> = self.iter().collect();
        term_list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        term_list
    }

    /// A counter holding only the terms accepted by `keep`, counts unchanged
    pub fn filtered<F>(&self, keep: F) -> FrequencyCounter
    where
        F: Fn(&str) -> bool,
    {
        self.iter().filter(|(term, _)| keep(term)).collect()
    }
}

impl<'a> IntoIterator for &'a FrequencyCounter {
    type Item = (&'a str, u64);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, u64)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
