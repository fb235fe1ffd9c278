use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::debug;

use crate::mbeans::connection::ManagementConnection;
use crate::mbeans::object_name::ObjectName;

/// Lists the beans of an endpoint sorted by name, so that successive passes
/// and successive runs iterate them in the same order.
pub fn list_beans(connection: &dyn ManagementConnection) -> Result<Vec<ObjectName>> {
    let names = connection
        .query_names()
        .context("Failed to list the MBeans")?;

    let names: Vec<ObjectName> = names.into_iter().sorted().dedup().collect();
    debug!("The endpoint has {} MBean(s)", names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbeans::connection::MockManagementConnection;

    fn names(names: &[&str]) -> Vec<ObjectName> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[test]
    fn test_beans_are_sorted_and_unique() {
        let mut connection = MockManagementConnection::new();
        connection.expect_query_names().returning(|| {
            Ok(names(&[
                "java.lang:type=Threading",
                "java.lang:type=Memory",
                "java.lang:type=ClassLoading",
                "java.lang:type=Memory",
            ]))
        });

        let beans = list_beans(&connection).unwrap();

        assert_eq!(
            beans,
            names(&[
                "java.lang:type=ClassLoading",
                "java.lang:type=Memory",
                "java.lang:type=Threading",
            ])
        );
    }

    #[test]
    fn test_listing_failure_propagates() {
        let mut connection = MockManagementConnection::new();
        connection
            .expect_query_names()
            .returning(|| Err(anyhow::anyhow!("connection reset")));

        let error = list_beans(&connection).unwrap_err();
        assert_eq!(error.to_string(), "Failed to list the MBeans");
    }
}
