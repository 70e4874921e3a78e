//! Container persistence traits
//!
//! Container members of a mapped class are stored in their own table.
//! Generated code supplies the statements as an [`OrderedFunctions`]
//! implementation; [`ContainerTraits`] says how a container type is
//! written, read back and replaced through them.

use crate::errors::Result;

/// Statements of an ordered container table
pub trait OrderedFunctions<I, V> {
    /// Insert `value` at `index`
    fn insert_one(&mut self, index: I, value: &V) -> Result<()>;

    /// Read the next row into `index` and `value`
    ///
    /// Returns whether another row follows.
    fn load_all(&mut self, index: &mut I, value: &mut V) -> Result<bool>;

    fn delete_all(&mut self) -> Result<()>;
}

/// How a container type is persisted
pub trait ContainerTraits {
    type Index;
    type Value;

    /// Write every element
    fn persist<F>(&self, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<Self::Index, Self::Value>;

    /// Replace the contents with the stored rows
    ///
    /// `more` is whether the container table has at least one row.
    fn load<F>(&mut self, more: bool, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<Self::Index, Self::Value>;

    /// Replace the stored rows with the current contents
    fn update<F>(&self, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<Self::Index, Self::Value>;

    /// Remove every stored row
    fn erase<F>(f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<Self::Index, Self::Value>;
}

impl<V: Default> ContainerTraits for Vec<V> {
    type Index = usize;
    type Value = V;

    fn persist<F>(&self, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<usize, V>,
    {
        for (i, value) in self.iter().enumerate() {
            f.insert_one(i, value)?;
        }
        Ok(())
    }

    fn load<F>(&mut self, mut more: bool, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<usize, V>,
    {
        self.clear();

        while more {
            // Rows arrive in index order; the stored index is not needed.
            let mut index = 0;
            let mut value = V::default();
            more = f.load_all(&mut index, &mut value)?;
            self.push(value);
        }
        Ok(())
    }

    fn update<F>(&self, f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<usize, V>,
    {
        f.delete_all()?;
        self.persist(f)
    }

    fn erase<F>(f: &mut F) -> Result<()>
    where
        F: OrderedFunctions<usize, V>,
    {
        f.delete_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OrmError;

    #[derive(Default)]
    struct Rows {
        rows: Vec<(usize, String)>,
        cursor: usize,
        fail_insert: bool,
    }

    impl OrderedFunctions<usize, String> for Rows {
        fn insert_one(&mut self, index: usize, value: &String) -> Result<()> {
            if self.fail_insert {
                return Err(OrmError::database("insert failed"));
            }
            self.rows.push((index, value.clone()));
            Ok(())
        }

        fn load_all(&mut self, index: &mut usize, value: &mut String) -> Result<bool> {
            let (i, v) = &self.rows[self.cursor];
            *index = *i;
            *value = v.clone();
            self.cursor += 1;
            Ok(self.cursor < self.rows.len())
        }

        fn delete_all(&mut self) -> Result<()> {
            self.rows.clear();
            self.cursor = 0;
            Ok(())
        }
    }

    #[test]
    fn test_persist_then_load() {
        let mut rows = Rows::default();
        let tricks = vec!["sit".to_string(), "roll".to_string()];
        tricks.persist(&mut rows).unwrap();

        let mut loaded = vec!["stale".to_string()];
        let more = !rows.rows.is_empty();
        loaded.load(more, &mut rows).unwrap();
        assert_eq!(loaded, tricks);
    }

    #[test]
    fn test_load_without_rows_clears() {
        let mut rows = Rows::default();
        let mut loaded = vec!["stale".to_string()];
        loaded.load(false, &mut rows).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_update_replaces_rows() {
        let mut rows = Rows::default();
        vec!["a".to_string(), "b".to_string()]
            .persist(&mut rows)
            .unwrap();
        vec!["c".to_string()].update(&mut rows).unwrap();
        assert_eq!(rows.rows, vec![(0, "c".to_string())]);

        Vec::<String>::erase(&mut rows).unwrap();
        assert!(rows.rows.is_empty());
    }

    #[test]
    fn test_persist_propagates_errors() {
        let mut rows = Rows {
            fail_insert: true,
            ..Rows::default()
        };
        let err = vec!["a".to_string()].persist(&mut rows).unwrap_err();
        assert!(matches!(err, OrmError::Database { .. }));
    }
}
