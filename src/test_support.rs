// In-process backend used by the HTTP-level tests

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use poem::{
    EndpointExt, IntoResponse, Request, Response, Route, Server, delete, get, handler,
    http::StatusCode,
    listener::TcpAcceptor,
    post,
    web::{Data, Json, Path, Query},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api_client::ApiClient;
use crate::storage::LocalStorage;

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct MockBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    pub owner: i64,
}

#[derive(Debug, Clone)]
struct MockComment {
    id: i64,
    book_id: i64,
    user_id: i64,
    content: String,
}

#[derive(Debug, Clone)]
struct MockReview {
    id: i64,
    book_id: i64,
    user_id: i64,
    content: String,
    rating: i64,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_id: i64,
    pub users: Vec<MockUser>,
    pub books: Vec<MockBook>,
    comments: Vec<MockComment>,
    reviews: Vec<MockReview>,
    /// (follower, followee)
    pub follows: BTreeSet<(i64, i64)>,
    /// "METHOD /path?query" for every request received
    pub requests: Vec<String>,
}

type Shared = Arc<Mutex<MockState>>;

impl MockState {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, req: &Request) {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default();
        self.requests.push(format!("{} {}", req.method(), target));
    }

    fn authed(&self, req: &Request) -> Option<i64> {
        let token = req.header("authorization")?.strip_prefix("Bearer ")?;
        let id: i64 = token.strip_prefix("token-")?.parse().ok()?;
        self.users.iter().any(|u| u.id == id).then_some(id)
    }

    fn user(&self, id: i64) -> Option<&MockUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_json(&self, id: i64) -> Value {
        match self.user(id) {
            Some(u) => json!({ "id": u.id, "username": u.username, "email": u.email }),
            None => Value::Null,
        }
    }

    fn summary_json(&self, id: i64) -> Value {
        match self.user(id) {
            Some(u) => json!({ "id": u.id, "username": u.username }),
            None => Value::Null,
        }
    }

    fn book_json(&self, b: &MockBook) -> Value {
        let comments = self.comments.iter().filter(|c| c.book_id == b.id).count();
        json!({
            "id": b.id,
            "title": b.title,
            "author": b.author,
            "description": b.description,
            "genre": b.genre,
            "coverImageUrl": b.cover_image_url,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "createdBy": self.summary_json(b.owner),
            "_count": { "comments": comments },
        })
    }
}

fn status(code: StatusCode, body: &str) -> Response {
    Response::builder().status(code).body(body.to_string())
}

fn unauthorized() -> Response {
    status(StatusCode::UNAUTHORIZED, "Unauthorized")
}

fn not_found() -> Response {
    status(StatusCode::NOT_FOUND, "Not Found")
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or("")
}

#[handler]
fn login(req: &Request, Data(shared): Data<&Shared>, Json(body): Json<Value>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let who = str_field(&body, "usernameOrEmail");
    let password = str_field(&body, "password");
    let found = st
        .users
        .iter()
        .find(|u| (u.username == who || u.email == who) && u.password == password)
        .map(|u| u.id);
    match found {
        Some(id) => Json(json!({ "token": format!("token-{id}"), "user": st.user_json(id) }))
            .into_response(),
        None => status(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

#[handler]
fn register(req: &Request, Data(shared): Data<&Shared>, Json(body): Json<Value>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let username = str_field(&body, "username").to_string();
    let email = str_field(&body, "email").to_string();
    let password = str_field(&body, "password").to_string();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return status(StatusCode::BAD_REQUEST, "username, email and password are required");
    }
    if st.users.iter().any(|u| u.username == username || u.email == email) {
        return status(StatusCode::CONFLICT, "User already exists");
    }
    let id = st.id();
    st.users.push(MockUser {
        id,
        username,
        email,
        password,
    });
    Json(json!({ "token": format!("token-{id}"), "user": st.user_json(id) })).into_response()
}

#[handler]
fn get_me(req: &Request, Data(shared): Data<&Shared>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    match st.authed(req) {
        Some(id) => Json(st.user_json(id)).into_response(),
        None => unauthorized(),
    }
}

#[handler]
fn update_me(req: &Request, Data(shared): Data<&Shared>, Json(body): Json<Value>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(id) = st.authed(req) else {
        return unauthorized();
    };
    if let Some(user) = st.users.iter_mut().find(|u| u.id == id) {
        if let Some(name) = body.get("username").and_then(Value::as_str) {
            user.username = name.to_string();
        }
        if let Some(email) = body.get("email").and_then(Value::as_str) {
            user.email = email.to_string();
        }
    }
    Json(st.user_json(id)).into_response()
}

#[handler]
fn followers(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let list: Vec<Value> = st
        .follows
        .iter()
        .filter(|(_, followee)| *followee == id)
        .map(|(follower, _)| st.user_json(*follower))
        .collect();
    Json(list).into_response()
}

#[handler]
fn following(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let list: Vec<Value> = st
        .follows
        .iter()
        .filter(|(follower, _)| *follower == id)
        .map(|(_, followee)| st.user_json(*followee))
        .collect();
    Json(list).into_response()
}

#[handler]
fn follow(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    if st.user(id).is_none() {
        return not_found();
    }
    if me == id {
        return status(StatusCode::BAD_REQUEST, "Cannot follow yourself");
    }
    st.follows.insert((me, id));
    Response::builder()
        .status(StatusCode::CREATED)
        .body(json!({ "followerId": me, "followingId": id }).to_string())
}

#[handler]
fn unfollow(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    st.follows.remove(&(me, id));
    status(StatusCode::NO_CONTENT, "")
}

#[derive(Debug, Deserialize)]
struct BooksQuery {
    search: Option<String>,
    genre: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[handler]
fn list_books(
    req: &Request,
    Data(shared): Data<&Shared>,
    Query(q): Query<BooksQuery>,
) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let search = q.search.unwrap_or_default().to_lowercase();
    let genre = q.genre.unwrap_or_default();
    let matching: Vec<&MockBook> = st
        .books
        .iter()
        .filter(|b| {
            search.is_empty()
                || b.title.to_lowercase().contains(&search)
                || b.author.to_lowercase().contains(&search)
        })
        .filter(|b| genre.is_empty() || b.genre.as_deref() == Some(genre.as_str()))
        .collect();
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).max(1);
    let data: Vec<Value> = matching
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .map(|b| st.book_json(b))
        .collect();
    Json(json!({ "data": data, "total": matching.len() })).into_response()
}

#[handler]
fn get_book(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    match st.books.iter().find(|b| b.id == id) {
        Some(b) => Json(st.book_json(b)).into_response(),
        None => not_found(),
    }
}

fn apply_book_body(book: &mut MockBook, body: &Value) {
    book.title = str_field(body, "title").to_string();
    book.author = str_field(body, "author").to_string();
    book.description = str_field(body, "description").to_string();
    book.genre = body.get("genre").and_then(Value::as_str).map(str::to_string);
    book.cover_image_url = body
        .get("coverImageUrl")
        .and_then(Value::as_str)
        .map(str::to_string);
}

#[handler]
fn create_book(req: &Request, Data(shared): Data<&Shared>, Json(body): Json<Value>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    if str_field(&body, "title").is_empty() || str_field(&body, "author").is_empty() {
        return status(StatusCode::BAD_REQUEST, "title and author are required");
    }
    let id = st.id();
    let mut book = MockBook {
        id,
        title: String::new(),
        author: String::new(),
        description: String::new(),
        genre: None,
        cover_image_url: None,
        owner: me,
    };
    apply_book_body(&mut book, &body);
    let json = st.book_json(&book);
    st.books.push(book);
    Response::builder()
        .status(StatusCode::CREATED)
        .body(json.to_string())
}

#[handler]
fn update_book(
    req: &Request,
    Data(shared): Data<&Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    let Some(idx) = st.books.iter().position(|b| b.id == id) else {
        return not_found();
    };
    if st.books[idx].owner != me {
        return status(StatusCode::FORBIDDEN, "Forbidden");
    }
    apply_book_body(&mut st.books[idx], &body);
    let book = st.books[idx].clone();
    Json(st.book_json(&book)).into_response()
}

#[handler]
fn delete_book(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    let Some(idx) = st.books.iter().position(|b| b.id == id) else {
        return not_found();
    };
    if st.books[idx].owner != me {
        return status(StatusCode::FORBIDDEN, "Forbidden");
    }
    st.books.remove(idx);
    status(StatusCode::NO_CONTENT, "")
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

#[handler]
fn list_comments(
    req: &Request,
    Data(shared): Data<&Shared>,
    Path(id): Path<i64>,
    Query(q): Query<PageQuery>,
) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(10).max(1);
    let data: Vec<Value> = st
        .comments
        .iter()
        .filter(|c| c.book_id == id)
        .skip((page - 1) * limit)
        .take(limit)
        .map(|c| {
            json!({
                "id": c.id,
                "content": c.content,
                "user": st.summary_json(c.user_id),
                "createdAt": "2024-01-02T00:00:00.000Z",
            })
        })
        .collect();
    Json(json!({ "data": data })).into_response()
}

#[handler]
fn post_comment(
    req: &Request,
    Data(shared): Data<&Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    let cid = st.id();
    let content = str_field(&body, "content").to_string();
    st.comments.push(MockComment {
        id: cid,
        book_id: id,
        user_id: me,
        content: content.clone(),
    });
    Json(json!({ "id": cid, "content": content, "user": st.summary_json(me) })).into_response()
}

#[handler]
fn list_reviews(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let data: Vec<Value> = st
        .reviews
        .iter()
        .filter(|r| r.book_id == id)
        .map(|r| {
            json!({
                "id": r.id,
                "content": r.content,
                "rating": r.rating,
                "user": st.summary_json(r.user_id),
                "createdAt": "2024-01-03T00:00:00.000Z",
            })
        })
        .collect();
    Json(data).into_response()
}

#[handler]
fn average_rating(req: &Request, Data(shared): Data<&Shared>, Path(id): Path<i64>) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let ratings: Vec<i64> = st
        .reviews
        .iter()
        .filter(|r| r.book_id == id)
        .map(|r| r.rating)
        .collect();
    if ratings.is_empty() {
        return Json(Value::Null).into_response();
    }
    let avg = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
    Json(json!(avg)).into_response()
}

#[handler]
fn create_review(
    req: &Request,
    Data(shared): Data<&Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = shared.lock();
    st.record(req);
    let Some(me) = st.authed(req) else {
        return unauthorized();
    };
    let rating = body.get("rating").and_then(Value::as_i64).unwrap_or(0);
    if !(1..=5).contains(&rating) {
        return status(StatusCode::BAD_REQUEST, "rating must be between 1 and 5");
    }
    let rid = st.id();
    let content = str_field(&body, "content").to_string();
    st.reviews.push(MockReview {
        id: rid,
        book_id: id,
        user_id: me,
        content: content.clone(),
        rating,
    });
    Json(json!({ "id": rid, "content": content, "rating": rating, "user": st.summary_json(me) }))
        .into_response()
}

// Fixed responses for exercising the HTTP wrapper

#[handler]
fn echo_headers(req: &Request) -> Response {
    Json(json!({
        "authorization": req.header("authorization"),
        "contentType": req.header("content-type"),
        "custom": req.header("x-custom"),
    }))
    .into_response()
}

#[handler]
fn fixed_status(Path(code): Path<u16>) -> Response {
    let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    status(code, &format!("failure {}", code.as_u16()))
}

#[handler]
fn empty_ok() -> Response {
    status(StatusCode::OK, "")
}

#[handler]
fn whitespace_ok() -> Response {
    status(StatusCode::OK, "  \n")
}

#[handler]
fn malformed() -> Response {
    status(StatusCode::OK, r#"{"id": 1, "title": "#)
}

pub struct MockServer {
    pub base_url: String,
    pub state: Shared,
}

impl MockServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = Route::new()
            .at("/auth/login", post(login))
            .at("/auth/register", post(register))
            .at("/users/me", get(get_me).put(update_me))
            .at("/users/:id/followers", get(followers))
            .at("/users/:id/following", get(following))
            .at("/users/:id/follow", post(follow).delete(unfollow))
            .at("/books", get(list_books).post(create_book))
            .at("/books/:id", get(get_book).put(update_book).delete(delete_book))
            .at("/books/:id/comments", get(list_comments).post(post_comment))
            .at("/books/:id/reviews", get(list_reviews).post(create_review))
            .at("/books/:id/reviews/average", get(average_rating))
            .at("/_test/headers", get(echo_headers).post(echo_headers))
            .at("/_test/status/:code", get(fixed_status).delete(fixed_status))
            .at("/_test/empty", get(empty_ok))
            .at("/_test/no-content", delete(fixed_status_no_content))
            .at("/_test/whitespace", get(whitespace_ok))
            .at("/_test/malformed", get(malformed))
            .data(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let acceptor = TcpAcceptor::from_tokio(listener).expect("mock backend acceptor");
        tokio::spawn(Server::new_with_acceptor(acceptor).run(app));

        MockServer {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn client(&self, storage: Arc<dyn LocalStorage>) -> ApiClient {
        ApiClient::new(&self.base_url, storage).expect("build client")
    }

    pub fn seed_user(&self, username: &str, password: &str) -> i64 {
        let mut st = self.state.lock();
        let id = st.id();
        st.users.push(MockUser {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
        });
        id
    }

    pub fn seed_book(&self, owner: i64, title: &str, author: &str, genre: &str) -> i64 {
        let mut st = self.state.lock();
        let id = st.id();
        st.books.push(MockBook {
            id,
            title: title.to_string(),
            author: author.to_string(),
            description: format!("About {title}"),
            genre: Some(genre.to_string()),
            cover_image_url: None,
            owner,
        });
        id
    }

    pub fn token_for(user_id: i64) -> String {
        format!("token-{user_id}")
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn count_requests(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    pub fn follows(&self) -> BTreeSet<(i64, i64)> {
        self.state.lock().follows.clone()
    }
}

#[handler]
fn fixed_status_no_content() -> Response {
    status(StatusCode::NO_CONTENT, "")
}
