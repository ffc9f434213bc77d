use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper for the storefront's credentials (the gateway signing key, the provisioning API key) that prevents
/// them from leaking into logs via `Debug` or `Display`. The only way to get the value back out is an explicit
/// [`Secret::reveal`] call, typically at the point where a signature is computed or a request is authenticated.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_never_leak_through_formatting() {
        let key = Secret::from("merchant-api-key".to_string());
        assert_eq!(format!("{key}"), "****");
        assert_eq!(format!("{key:?}"), "****");
        assert_eq!(format!("{:?}", Some(&key)), "Some(****)");
        assert_eq!(key.reveal().as_str(), "merchant-api-key");
    }
}
