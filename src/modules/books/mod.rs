pub mod models;
pub mod query;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use biblio_http::error::AppError;
use biblio_kernel::{settings::BooksSettings, InitCtx, Module};
use biblio_store::BookStore;

use models::{BookPayload, BookResponse, PageResponse};
use query::ListParams;
use service::BookService;

/// Books module: the catalog CRUD surface mounted at `/api/books`.
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, settings: BooksSettings) -> Self {
        Self {
            service: Arc::new(BookService::new(store, settings)),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            sort_policy = ?ctx.settings.books.sort_policy,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route("/health", get(health_check))
            .route(
                "/{id}",
                get(get_book)
                    .put(replace_book)
                    .patch(patch_book_price)
                    .delete(delete_book),
            )
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(service): State<Arc<BookService>>,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, AppError> {
    let record = service.create(payload).await?;
    let response = BookResponse::from(record);
    let location = format!("/api/books/{}", response.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

async fn list_books(
    State(service): State<Arc<BookService>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse>, AppError> {
    let page = service.list(&params).await?;
    Ok(Json(PageResponse::from(page)))
}

async fn get_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<u64>,
) -> Result<Json<BookResponse>, AppError> {
    let record = service.get(id).await?;
    Ok(Json(BookResponse::from(record)))
}

async fn replace_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<u64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookResponse>, AppError> {
    let record = service.replace(id, payload).await?;
    Ok(Json(BookResponse::from(record)))
}

/// PATCH takes the raw decimal string as the body, not JSON.
async fn patch_book_price(
    State(service): State<Arc<BookService>>,
    Path(id): Path<u64>,
    body: String,
) -> Result<Json<BookResponse>, AppError> {
    let record = service.patch_price(id, &body).await?;
    Ok(Json(BookResponse::from(record)))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<u64>,
) -> Result<Json<BookResponse>, AppError> {
    let record = service.delete(id).await?;
    Ok(Json(BookResponse::from(record)))
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books with filtering, sorting, and pagination",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "page", "in": "query", "schema": { "type": "integer", "default": 0 } },
                        { "name": "size", "in": "query", "schema": { "type": "integer", "default": 10 } },
                        { "name": "title", "in": "query", "schema": { "type": "string" }, "description": "Case-insensitive title substring" },
                        { "name": "author", "in": "query", "schema": { "type": "string" }, "description": "Case-insensitive author substring" },
                        { "name": "startPrice", "in": "query", "schema": { "type": "string", "default": "0" } },
                        { "name": "endPrice", "in": "query", "schema": { "type": "string", "default": "1000000" } },
                        { "name": "releaseDateFrom", "in": "query", "schema": { "type": "string" }, "description": "Format: dd-MM-yyyy", "example": "01-01-0001" },
                        { "name": "releaseDateTo", "in": "query", "schema": { "type": "string" }, "description": "Format: dd-MM-yyyy", "example": "31-12-9999" },
                        { "name": "sortBy", "in": "query", "schema": { "type": "string" }, "description": "Up to four 'field:ASC|DESC' clauses separated by commas, primary first. Fields: title, author, price, releaseDate. E.g. 'title:DESC, price:ASC'" }
                    ],
                    "responses": {
                        "200": {
                            "description": "One page of books plus pagination metadata",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPage" }
                                }
                            }
                        },
                        "400": {
                            "description": "Malformed price, date, or sort parameter",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/BookPayload" }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "Book created",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "400": {
                            "description": "Validation failed",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        },
                        "409": {
                            "description": "A book with the same title, author, and release date already exists",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book by id",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "The requested book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "404": {
                            "description": "Book not found",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                },
                "put": {
                    "summary": "Replace all business fields of a book",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/BookPayload" }
                            }
                        }
                    },
                    "responses": {
                        "200": { "description": "The updated book" },
                        "400": { "description": "Validation failed" },
                        "404": { "description": "Book not found" }
                    }
                },
                "patch": {
                    "summary": "Update only the price of a book",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "requestBody": {
                        "required": true,
                        "description": "The new price as a plain decimal string",
                        "content": {
                            "text/plain": {
                                "schema": { "type": "string", "example": "1299.50" }
                            }
                        }
                    },
                    "responses": {
                        "200": { "description": "The updated book" },
                        "400": { "description": "Body is not a valid decimal" },
                        "404": { "description": "Book not found" }
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer", "format": "int64" } }
                    ],
                    "responses": {
                        "200": { "description": "The deleted book" },
                        "404": { "description": "Book not found" }
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "price": { "type": "string", "description": "Exact decimal" },
                        "releaseDate": { "type": "string", "description": "Format: dd-MM-yyyy" },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "lastModified": { "type": "string", "format": "date-time" },
                        "_links": { "type": "object" }
                    },
                    "required": ["id", "title", "author", "price", "releaseDate"]
                },
                "BookPayload": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "price": { "type": "string", "description": "Non-negative exact decimal" },
                        "releaseDate": { "type": "string", "description": "Format: dd-MM-yyyy" }
                    },
                    "required": ["title", "author", "price", "releaseDate"]
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        },
                        "page": { "type": "integer" },
                        "size": { "type": "integer" },
                        "totalElements": { "type": "integer" },
                        "totalPages": { "type": "integer" },
                        "_links": { "type": "object" }
                    },
                    "required": ["content", "page", "size", "totalElements", "totalPages"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(
    store: Arc<dyn BookStore>,
    settings: BooksSettings,
) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use biblio_store::MemoryStore;
    use tower::ServiceExt;

    fn module() -> BooksModule {
        BooksModule::new(Arc::new(MemoryStore::new()), BooksSettings::default())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn quijote_body() -> serde_json::Value {
        json!({
            "title": "Don Quijote de la Mancha",
            "author": "Miguel de Cervantes",
            "price": "999.95",
            "releaseDate": "16-01-1605"
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_get_and_conflict_scenario() {
        let module = module();
        let router = module.routes();

        // POST -> 201 with assigned id and self link.
        let response = router
            .clone()
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let created = body_json(response).await;
        let id = created["id"].as_u64().unwrap();
        assert_eq!(location, format!("/api/books/{id}"));
        assert_eq!(created["_links"]["self"]["href"], location);

        // GET -> identical business fields.
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["title"], "Don Quijote de la Mancha");
        assert_eq!(fetched["author"], "Miguel de Cervantes");
        assert_eq!(fetched["price"], "999.95");
        assert_eq!(fetched["releaseDate"], "16-01-1605");

        // POST the same triple again -> 409.
        let response = router
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_with_missing_fields_is_bad_request_with_field_details() {
        let router = module().routes();

        let response = router
            .oneshot(post_json("/", json!({"title": "Only a title"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["details"].as_array().unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let router = module().routes();

        let response = router
            .oneshot(Request::builder().uri("/99").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Could not find book 99");
    }

    #[tokio::test]
    async fn list_returns_page_metadata() {
        let module = module();
        let router = module.routes();

        router
            .clone()
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/?title=quijote&sortBy=price:DESC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["totalElements"], 1);
        assert_eq!(body["page"], 0);
        assert_eq!(body["size"], 10);
        assert_eq!(body["content"][0]["title"], "Don Quijote de la Mancha");
    }

    #[tokio::test]
    async fn list_with_bad_price_filter_is_bad_request() {
        let router = module().routes();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/?startPrice=cheap")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_with_malformed_sort_is_bad_request_under_strict_policy() {
        let router = module().routes();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/?sortBy=isbn:ASC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "malformed_sort");
    }

    #[tokio::test]
    async fn patch_updates_price_and_rejects_garbage() {
        let module = module();
        let router = module.routes();

        let response = router
            .clone()
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/{id}"))
                    .body(Body::from("1299.50"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["price"], "1299.50");

        let response = router
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/{id}"))
                    .body(Body::from("bad price"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_returns_the_book_then_not_found() {
        let module = module();
        let router = module.routes();

        let response = router
            .clone()
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["title"],
            "Don Quijote de la Mancha"
        );

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replace_overwrites_the_record() {
        let module = module();
        let router = module.routes();

        let response = router
            .clone()
            .oneshot(post_json("/", quijote_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/{id}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "title": "Novelas ejemplares",
                            "author": "Miguel de Cervantes",
                            "price": "450",
                            "releaseDate": "01-01-1613"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["title"], "Novelas ejemplares");
        assert_eq!(body["releaseDate"], "01-01-1613");
    }

    #[test]
    fn openapi_fragment_covers_the_crud_surface() {
        let fragment = openapi_fragment();

        assert!(fragment["paths"]["/"]["post"].is_object());
        assert!(fragment["paths"]["/"]["get"].is_object());
        assert!(fragment["paths"]["/{id}"]["put"].is_object());
        assert!(fragment["paths"]["/{id}"]["patch"].is_object());
        assert!(fragment["paths"]["/{id}"]["delete"].is_object());
        assert!(fragment["components"]["schemas"]["Book"].is_object());
    }
}
