use crate::converters::*;
use ahash::AHashMap;

/// A versioned node-type tag such as `.v2018_2_3.SuperJoin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag<'a> {
    pub version: Option<&'a str>,
    pub base: &'a str,
}

impl<'a> TypeTag<'a> {
    /// Splits off the trailing component (the bare type) and the version before it.
    pub fn parse(tag: &'a str) -> Self {
        match tag.rsplit_once('.') {
            Some((head, base)) => Self {
                version: head.rsplit('.').next().filter(|v| !v.is_empty()),
                base,
            },
            None => Self {
                version: None,
                base: tag,
            },
        }
    }
}

/// How a tag was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    /// Matched the registered tag by bare type.
    Suffix(String),
    Fallback,
}

/// Tag-keyed strategy table.
///
/// Lookup: exact tag, then the last registered tag with the same bare type,
/// then the fallback strategy. The lookup never fails.
pub struct Registry<C: ?Sized> {
    entries: Vec<(String, Box<C>)>,
    exact: AHashMap<String, usize>,
    by_base: AHashMap<String, usize>,
    fallback: Box<C>,
}

impl<C: ?Sized> Registry<C> {
    pub fn new(fallback: Box<C>) -> Self {
        Self {
            entries: Vec::new(),
            exact: AHashMap::new(),
            by_base: AHashMap::new(),
            fallback,
        }
    }

    /// Registers a strategy. Re-registering a tag replaces it and makes it the
    /// latest match for its bare type.
    pub fn register(&mut self, tag: impl Into<String>, converter: Box<C>) {
        let tag = tag.into();
        let index = match self.exact.get(&tag) {
            Some(&index) => {
                self.entries[index].1 = converter;
                index
            }
            None => {
                self.entries.push((tag.clone(), converter));
                let index = self.entries.len() - 1;
                self.exact.insert(tag.clone(), index);
                index
            }
        };
        let base = TypeTag::parse(&tag).base.to_string();
        self.by_base.insert(base, index);
    }

    pub fn resolve(&self, tag: &str) -> &C {
        self.resolve_with(tag).0
    }

    pub fn resolve_with(&self, tag: &str) -> (&C, Resolution) {
        if let Some(&index) = self.exact.get(tag) {
            return (self.entries[index].1.as_ref(), Resolution::Exact);
        }
        if let Some(&index) = self.by_base.get(TypeTag::parse(tag).base) {
            let (registered, converter) = &self.entries[index];
            return (converter.as_ref(), Resolution::Suffix(registered.clone()));
        }
        (self.fallback.as_ref(), Resolution::Fallback)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.exact.contains_key(tag)
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> Vec<&str> {
        self.entries.iter().map(|(tag, _)| tag.as_str()).collect()
    }

    pub fn fallback(&self) -> &C {
        self.fallback.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Defines the default registration function and the by-tag constructor for a
/// strategy family.
macro_rules! define_converters {
    (
        $trait_name:ident, $fallback:expr, $register_fn:ident, $create_fn:ident;
        $( $tag:literal => $ty:ident $( ( $($arg:expr),* ) )? ),* $(,)?
    ) => {
        /// A registry holding every built-in strategy in registration order.
        pub fn $register_fn() -> Registry<dyn $trait_name> {
            let mut registry: Registry<dyn $trait_name> = Registry::new(Box::new($fallback));
            $( registry.register($tag, Box::new($ty::new($tag $( $(, $arg)* )?))); )*
            registry
        }

        /// Creates a built-in strategy by its registered tag.
        pub fn $create_fn(tag: &str) -> Option<Box<dyn $trait_name>> {
            match tag {
                $( $tag => Some(Box::new($ty::new($tag $( $(, $arg)* )?))), )*
                _ => None,
            }
        }
    };
}

define_converters! {
    NodeConverter, UnknownConverter::new(), default_node_registry, create_converter_by_tag;
    ".v1.LoadSql" => LoadConverter(load::LOAD_SQL_REQUIRED),
    ".v2019_3_1.LoadSqlProxy" => LoadConverter(load::LOAD_FILE_REQUIRED),
    ".v1.LoadCsv" => LoadConverter(load::LOAD_FILE_REQUIRED),
    ".v1.LoadCsvInputUnion" => LoadConverter(load::LOAD_FILE_REQUIRED),
    ".v1.LoadExcel" => LoadConverter(load::LOAD_FILE_REQUIRED),
    ".v1.Container" => ContainerConverter,
    ".v1.WriteToHyper" => OutputConverter,
    ".v2018_2_3.SuperAggregate" => AggregateConverter,
    ".v2018_2_3.SuperJoin" => JoinConverter,
    ".v2018_2_3.SuperTransform" => TransformConverter,
}

define_converters! {
    AnnotationConverter, UnknownAnnotation::new(), default_annotation_registry, create_annotation_by_tag;
    ".v1.AddColumn" => AddColumn,
    ".v1.ChangeColumnType" => ChangeColumnType,
    ".v2019_2_3.DuplicateColumn" => DuplicateColumn,
    ".v1.FilterOperation" => FilterOperation,
    ".v2019_2_2.KeepOnlyColumns" => KeepOnlyColumns,
    ".v2018_3_3.QuickCalcColumn" => AddColumn,
    ".v2019_1_4.Remap" => Remap,
    ".v1.RemoveColumns" => RemoveColumns,
    ".v1.RenameColumn" => RenameColumn,
}
