use crate::models::{Property, PropertyDetails};
use crate::store::{IndexOutcome, PropertyQuery, PropertyStore, StoreError, PROPERTY_COLLECTION};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info, warn};

/// MongoDB-backed property store
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Create a client for `url` and bind it to `database_name`
    ///
    /// The driver connects lazily, so an unreachable server is only logged here.
    pub async fn connect(url: &str, database_name: &str) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB...");

        let options = ClientOptions::parse(url).await.map_err(classify)?;
        let client = Client::with_options(options).map_err(classify)?;
        let database = client.database(database_name);

        match database.run_command(doc! { "ping": 1 }, None).await {
            Ok(_) => info!("Successfully connected to MongoDB database {}", database_name),
            Err(e) => warn!("MongoDB did not answer ping: {}", e),
        }

        Ok(Self { database })
    }

    fn properties(&self) -> Collection<Document> {
        self.database.collection(PROPERTY_COLLECTION)
    }
}

/// Driver errors that mean the server was never reached
fn classify(err: MongoError) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Operation(err.to_string()),
    }
}

/// Mongo filter for `query`: `$eq` clauses plus `$geoWithin` on `location`
///
/// Every value is wrapped in `$eq` so operator documents match literally.
pub fn build_filter(query: &PropertyQuery) -> Result<Document, StoreError> {
    let mut filter = Document::new();

    for (key, value) in &query.filters {
        if key.starts_with('$') {
            return Err(StoreError::Operation(format!(
                "operator {} is not an attribute filter",
                key
            )));
        }
        let value = bson::to_bson(value)
            .map_err(|e| StoreError::Operation(format!("invalid filter {}: {}", key, e)))?;
        filter.insert(key.clone(), doc! { "$eq": value });
    }

    if let Some(region) = &query.region {
        let coordinates = bson::to_bson(&region.coordinates)
            .map_err(|e| StoreError::Operation(format!("invalid polygon: {}", e)))?;
        filter.insert(
            "location",
            doc! {
                "$geoWithin": {
                    "$geometry": {
                        "type": "Polygon",
                        "coordinates": coordinates,
                    }
                }
            },
        );
    }

    Ok(filter)
}

/// Bookkeeping fields never leave the database
fn projection() -> Document {
    doc! { "created_at": 0, "updated_at": 0 }
}

fn into_property(mut document: Document) -> Result<Property, StoreError> {
    let id = match document.remove("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(id)) => id,
        Some(other) => other.to_string(),
        None => return Err(StoreError::Operation("document has no _id".to_string())),
    };

    let details: PropertyDetails = bson::from_document(document)
        .map_err(|e| StoreError::Operation(format!("malformed property {}: {}", id, e)))?;

    Ok(Property { id, details })
}

#[async_trait]
impl PropertyStore for MongoStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn ensure_geo_index(&self) -> Result<IndexOutcome, StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "location": "2dsphere" })
            .build();

        match self.properties().create_index(index, None).await {
            Ok(_) => Ok(IndexOutcome::Created),
            Err(err) => match classify(err) {
                StoreError::Operation(reason) => Ok(IndexOutcome::Rejected(reason)),
                unavailable => Err(unavailable),
            },
        }
    }

    async fn insert(&self, details: &PropertyDetails) -> Result<String, StoreError> {
        let mut document = bson::to_document(details)
            .map_err(|e| StoreError::Operation(format!("cannot encode property: {}", e)))?;
        let now = bson::DateTime::from_chrono(Utc::now());
        document.insert("created_at", now);
        document.insert("updated_at", now);

        let result = self
            .properties()
            .insert_one(document, None)
            .await
            .map_err(classify)?;

        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        debug!("Inserted property {}", id);

        Ok(id)
    }

    async fn find(&self, query: &PropertyQuery) -> Result<Vec<Property>, StoreError> {
        let filter = build_filter(query)?;
        debug!("Finding properties with filter {}", filter);

        let options = FindOptions::builder()
            .projection(projection())
            .limit(i64::from(query.limit))
            .build();

        let mut cursor = self
            .properties()
            .find(filter, options)
            .await
            .map_err(classify)?;

        let mut properties = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(classify)? {
            match into_property(document) {
                Ok(property) => properties.push(property),
                Err(e) => warn!("Skipping unreadable document: {}", e),
            }
        }

        Ok(properties)
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        self.database
            .list_collection_names(None)
            .await
            .map_err(classify)
    }
}
