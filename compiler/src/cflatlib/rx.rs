//! Regular expressions which are compiled the first time they are
//! used, so that they can live in `static` items.
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::OnceLock;

use regex::Regex;

pub(crate) struct LazyRegex {
    compiled: OnceLock<Regex>,
    pattern: &'static str,
    whole_token: bool,
}

impl LazyRegex {
    /// A pattern which may match anywhere in the text it is given.
    pub(crate) const fn new(pattern: &'static str) -> LazyRegex {
        LazyRegex {
            compiled: OnceLock::new(),
            pattern,
            whole_token: false,
        }
    }

    /// A pattern which only matches when it covers the whole of a
    /// token.
    pub(crate) const fn token(pattern: &'static str) -> LazyRegex {
        LazyRegex {
            compiled: OnceLock::new(),
            pattern,
            whole_token: true,
        }
    }

    fn source(&self) -> Cow<'static, str> {
        if self.whole_token {
            Cow::Owned(format!("^(?:{})$", self.pattern))
        } else {
            Cow::Borrowed(self.pattern)
        }
    }
}

impl Deref for LazyRegex {
    type Target = Regex;

    fn deref(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            let source = self.source();
            match Regex::new(&source) {
                Ok(r) => r,
                Err(e) => {
                    panic!("'{source}' is not a valid regular expression: {e}");
                }
            }
        })
    }
}
