//! Sort and transform stage.
//!
//! Runs once per content type, between fetch and binding. Sorting reorders
//! without touching values; transforming reshapes each entry in place and
//! keeps positions.

use std::{cmp::Ordering, fmt, sync::Arc};

use entrypress_core::{
    CompositionOrder, Entry, FieldValue, SortSpec, TransformSpec,
};

/// Comparator over entries. Must be a total order; applied with a stable sort.
pub type SortFn = Arc<dyn Fn(&Entry, &Entry) -> Ordering + Send + Sync>;

/// Per-entry reshaping function.
pub type TransformFn = Arc<dyn Fn(Entry) -> Entry + Send + Sync>;

/// The configured sort/transform pair for one content type.
#[derive(Clone, Default)]
pub struct EntryPipeline {
    sort: Option<SortFn>,
    transform: Option<TransformFn>,
    order: CompositionOrder,
}

impl fmt::Debug for EntryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPipeline")
            .field("sort", &self.sort.is_some())
            .field("transform", &self.transform.is_some())
            .field("order", &self.order)
            .finish()
    }
}

impl EntryPipeline {
    /// Identity pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the declarative config forms.
    #[must_use]
    pub fn from_specs(
        sort: Option<&SortSpec>,
        transform: Option<&TransformSpec>,
        order: CompositionOrder,
    ) -> Self {
        Self {
            sort: sort.map(sort_by_field),
            transform: transform.map(reshape),
            order,
        }
    }

    /// Set the comparator.
    #[must_use]
    pub fn with_sort(
        mut self,
        sort: impl Fn(&Entry, &Entry) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(Arc::new(sort));
        self
    }

    /// Set the per-entry transform.
    #[must_use]
    pub fn with_transform(mut self, transform: impl Fn(Entry) -> Entry + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Set how sort and transform compose.
    #[must_use]
    pub fn with_order(mut self, order: CompositionOrder) -> Self {
        self.order = order;
        self
    }

    /// Whether the pipeline changes anything.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.sort.is_none() && self.transform.is_none()
    }

    /// Run the pipeline over a fetched list.
    #[must_use]
    pub fn apply(&self, entries: Vec<Entry>) -> Vec<Entry> {
        match self.order {
            CompositionOrder::SortThenTransform => self.run_transform(self.run_sort(entries)),
            CompositionOrder::TransformThenSort => self.run_sort(self.run_transform(entries)),
        }
    }

    fn run_sort(&self, mut entries: Vec<Entry>) -> Vec<Entry> {
        if let Some(sort) = &self.sort {
            entries.sort_by(|a, b| sort(a, b));
        }
        entries
    }

    fn run_transform(&self, entries: Vec<Entry>) -> Vec<Entry> {
        match &self.transform {
            Some(transform) => entries.into_iter().map(|e| transform(e)).collect(),
            None => entries,
        }
    }
}

/// Comparator for `sort = { field = "...", descending = ... }`.
///
/// Entries missing the field sort after all others in either direction.
#[must_use]
pub fn sort_by_field(spec: &SortSpec) -> SortFn {
    let field = spec.field.clone();
    let descending = spec.descending;

    Arc::new(move |a: &Entry, b: &Entry| match (a.get(&field), b.get(&field)) {
        (Some(x), Some(y)) => {
            let ord = x.compare(y);
            if descending { ord.reverse() } else { ord }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

/// Transform for `transform = { keep, drop, rename, set }`.
#[must_use]
pub fn reshape(spec: &TransformSpec) -> TransformFn {
    let spec = spec.clone();

    Arc::new(move |mut entry: Entry| {
        if !spec.keep.is_empty() {
            entry.fields.retain(|key, _| spec.keep.contains(key));
        }
        for key in &spec.drop {
            entry.fields.shift_remove(key);
        }
        for (from, to) in &spec.rename {
            if from == to || !entry.fields.contains_key(from) {
                continue;
            }
            entry.fields.shift_remove(to);
            if let Some(index) = entry.fields.get_index_of(from)
                && let Some((_, value)) = entry.fields.shift_remove_index(index)
            {
                entry.fields.shift_insert(index, to.clone(), value);
            }
        }
        for (key, value) in &spec.set {
            entry
                .fields
                .insert(key.clone(), FieldValue::from(value.clone()));
        }
        entry
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn entries() -> Vec<Entry> {
        [
            ("Title C", "Rich Boy selling crick"),
            ("Title B", "Something else"),
            ("Title A", "Nothing interesting"),
        ]
        .into_iter()
        .map(|(title, body)| Entry::default().with_field("title", title).with_field("body", body))
        .collect()
    }

    fn titles(entries: &[Entry]) -> Vec<&str> {
        entries
            .iter()
            .map(|e| e.get("title").and_then(FieldValue::as_str).unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_identity() {
        let pipeline = EntryPipeline::new();
        assert!(pipeline.is_identity());
        assert_eq!(pipeline.apply(entries()), entries());
    }

    #[test]
    fn test_sort_orders_without_touching_values() {
        let by_title = sort_by_field(&SortSpec {
            field: "title".to_string(),
            descending: false,
        });
        let pipeline = EntryPipeline::new().with_sort(move |a: &Entry, b: &Entry| by_title(a, b));

        let sorted = pipeline.apply(entries());
        assert_eq!(titles(&sorted), vec!["Title A", "Title B", "Title C"]);
        assert_eq!(
            sorted[0].get("body").and_then(FieldValue::as_str),
            Some("Nothing interesting")
        );
    }

    #[test]
    fn test_sort_descending_from_config() {
        let spec = SortSpec {
            field: "title".to_string(),
            descending: true,
        };
        let pipeline =
            EntryPipeline::from_specs(Some(&spec), None, CompositionOrder::default());

        let mut input = entries();
        input.reverse();
        assert_eq!(
            titles(&pipeline.apply(input)),
            vec!["Title C", "Title B", "Title A"]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let input = vec![
            Entry::default().with_field("rank", 1_i64).with_field("title", "first"),
            Entry::default().with_field("rank", 0_i64).with_field("title", "zero"),
            Entry::default().with_field("rank", 1_i64).with_field("title", "second"),
        ];
        let pipeline = EntryPipeline::new().with_sort(|a: &Entry, b: &Entry| {
            let rank = |e: &Entry| e.get("rank").cloned().unwrap_or(FieldValue::Null);
            rank(a).compare(&rank(b))
        });

        assert_eq!(
            titles(&pipeline.apply(input)),
            vec!["zero", "first", "second"]
        );
    }

    #[test]
    fn test_missing_sort_field_goes_last() {
        let input = vec![
            Entry::default().with_field("title", "untitled-rank"),
            Entry::default().with_field("title", "b").with_field("rank", 2_i64),
            Entry::default().with_field("title", "a").with_field("rank", 1_i64),
        ];
        let spec = SortSpec {
            field: "rank".to_string(),
            descending: true,
        };
        let pipeline = EntryPipeline::from_specs(Some(&spec), None, CompositionOrder::default());

        assert_eq!(titles(&pipeline.apply(input)), vec!["b", "a", "untitled-rank"]);
    }

    #[test]
    fn test_transform_preserves_order() {
        let pipeline = EntryPipeline::new().with_transform(|entry: Entry| {
            entry.with_field("body", "Transformed!")
        });

        let transformed = pipeline.apply(entries());
        assert_eq!(titles(&transformed), vec!["Title C", "Title B", "Title A"]);
        assert!(transformed
            .iter()
            .all(|e| e.get("body").and_then(FieldValue::as_str) == Some("Transformed!")));
    }

    #[test]
    fn test_reshape_keep_drop_rename_set() {
        let spec = TransformSpec {
            keep: vec!["title".to_string(), "body".to_string()],
            drop: vec!["body".to_string()],
            rename: [("title".to_string(), "heading".to_string())].into_iter().collect(),
            set: [("kind".to_string(), json!("post"))].into_iter().collect(),
        };
        let entry = Entry::default()
            .with_field("title", "Real Talk")
            .with_field("body", "words")
            .with_field("category", "hits");

        let reshaped = reshape(&spec)(entry);
        let keys: Vec<_> = reshaped.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["heading", "kind"]);
        assert_eq!(
            reshaped.get("heading").and_then(FieldValue::as_str),
            Some("Real Talk")
        );
    }

    #[test]
    fn test_composition_order() {
        // Transform rewrites titles so that sorting after it gives a different order.
        let rewrite = |entry: Entry| {
            let flipped = match entry.get("title").and_then(FieldValue::as_str) {
                Some("Title A") => "Z",
                Some("Title C") => "A",
                _ => "M",
            };
            entry.with_field("title", flipped)
        };
        let by_title = SortSpec {
            field: "title".to_string(),
            descending: false,
        };

        let sort_first = EntryPipeline::from_specs(Some(&by_title), None, CompositionOrder::SortThenTransform)
            .with_transform(rewrite);
        let transform_first =
            EntryPipeline::from_specs(Some(&by_title), None, CompositionOrder::TransformThenSort)
                .with_transform(rewrite);

        assert_eq!(titles(&sort_first.apply(entries())), vec!["Z", "M", "A"]);
        assert_eq!(titles(&transform_first.apply(entries())), vec!["A", "M", "Z"]);
    }
}
