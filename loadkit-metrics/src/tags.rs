/// Sorted, de-duplicated set of `key=value` tags identifying one series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    pub(crate) tags: Vec<(String, String)>,
}

impl TagSet {
    /// Builds a tag set; for repeated keys the last value wins.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut tags: Vec<(String, String)> = Vec::new();
        for (k, v) in pairs {
            match tags.iter_mut().find(|(ek, _)| ek == k) {
                Some(existing) => existing.1 = v.to_string(),
                None => tags.push((k.to_string(), v.to_string())),
            }
        }
        tags.sort_unstable();
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let idx = self.tags.partition_point(|(k, _)| k.as_str() < key);
        self.tags
            .get(idx)
            .and_then(|(k, v)| (k == key).then_some(v.as_str()))
    }

    pub fn to_vec(&self) -> Vec<(String, String)> {
        self.tags.clone()
    }
}
