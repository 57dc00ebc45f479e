//! JSON document rendering for server resources.

use rand::RngExt;
use serde_json::{Value, json};

use stratus_entity::id::ServerId;
use stratus_entity::server::{ServerResource, ServerStatus};

/// Generate the canned address document a server is born with: one private
/// and one public IPv4 address.
pub fn generate_addresses() -> Value {
    let mut rng = rand::rng();
    let private = format!(
        "10.180.{}.{}",
        rng.random_range(1..255u16),
        rng.random_range(1..255u16)
    );
    let public = format!(
        "198.101.{}.{}",
        rng.random_range(1..255u16),
        rng.random_range(1..255u16)
    );
    json!({
        "private": [{"addr": private, "version": 4}],
        "public": [{"addr": public, "version": 4}],
    })
}

/// Self and bookmark links for a server.
pub fn links(prefix: &str, id: ServerId) -> Value {
    json!([
        {"href": format!("{prefix}/servers/{id}"), "rel": "self"},
        {"href": format!("{prefix}/servers/{id}"), "rel": "bookmark"},
    ])
}

/// The brief list document: id, name, links.
pub fn brief(server: &ServerResource, prefix: &str) -> Value {
    json!({
        "id": server.id,
        "name": server.name,
        "links": links(prefix, server.id),
    })
}

/// The detail document returned by get and detail listings.
pub fn detail(server: &ServerResource, prefix: &str) -> Value {
    let progress = match server.status {
        ServerStatus::Active => 100,
        _ => 0,
    };
    json!({
        "id": server.id,
        "name": server.name,
        "status": server.status,
        "tenant_id": server.tenant_id,
        "user_id": server.user_id,
        "flavor": {"id": server.flavor_ref},
        "image": {"id": server.image_ref},
        "metadata": server.metadata,
        "addresses": server.addresses,
        "accessIPv4": "",
        "accessIPv6": "",
        "progress": progress,
        "created": server.created_at.to_rfc3339(),
        "updated": server.updated_at.to_rfc3339(),
        "links": links(prefix, server.id),
    })
}

/// The creation response document: id, links, and the issued admin
/// password.
pub fn created(server: &ServerResource, prefix: &str) -> Value {
    json!({
        "server": {
            "id": server.id,
            "links": links(prefix, server.id),
            "adminPass": server.admin_pass,
        }
    })
}

/// A next-page link element for a truncated listing.
pub fn next_link(prefix: &str, path: &str, marker: ServerId, limit: Option<usize>) -> Value {
    let mut href = format!("{prefix}/{path}?marker={marker}");
    if let Some(limit) = limit {
        href.push_str(&format!("&limit={limit}"));
    }
    json!([{"href": href, "rel": "next"}])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use super::*;

    fn server() -> ServerResource {
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .expect("valid")
            .with_timezone(&Utc);
        ServerResource {
            id: ServerId::new(),
            name: "web-1".to_string(),
            tenant_id: "t1".to_string(),
            user_id: Uuid::new_v4(),
            status: ServerStatus::Active,
            flavor_ref: "2".to_string(),
            previous_flavor_ref: None,
            image_ref: "img".to_string(),
            metadata: BTreeMap::new(),
            addresses: generate_addresses(),
            admin_pass: "pw".to_string(),
            created_at: now,
            updated_at: now,
            pending: None,
        }
    }

    #[test]
    fn test_detail_document_shape() {
        let server = server();
        let doc = detail(&server, "{base}/compute/v2/t1");
        assert_eq!(doc["status"], "ACTIVE");
        assert_eq!(doc["progress"], 100);
        assert_eq!(doc["flavor"]["id"], "2");
        assert!(doc["links"][0]["href"]
            .as_str()
            .expect("href")
            .starts_with("{base}/compute/v2/t1/servers/"));
    }

    #[test]
    fn test_generated_addresses_have_both_networks() {
        let addresses = generate_addresses();
        assert!(addresses["private"][0]["addr"]
            .as_str()
            .expect("addr")
            .starts_with("10.180."));
        assert_eq!(addresses["public"][0]["version"], 4);
    }

    #[test]
    fn test_next_link_carries_marker_and_limit() {
        let id = ServerId::new();
        let link = next_link("{base}/compute/v2/t1", "servers", id, Some(2));
        let href = link[0]["href"].as_str().expect("href");
        assert!(href.contains(&format!("marker={id}")));
        assert!(href.contains("limit=2"));
    }
}
