//! The three role-scoped user collections.
//!
//! Each group gets its own routes; a user looked up in a collection they do
//! not belong to is a 404, which is what the client's role probe relies on.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};

use crate::model::{Account, Group, NewUser, User, UserUpdate};
use crate::{caller, optional_caller, require_admin, Db, Failure, Store};

pub fn routes(router: Router<Db>) -> Router<Db> {
    [Group::Visitor, Group::Editor, Group::Admin]
        .into_iter()
        .fold(router, |router, group| {
            let segment = group.segment();
            router
                .route(
                    &format!("/app/{segment}/"),
                    get(move |state: State<Db>, headers: HeaderMap| list(group, state, headers)).post(
                        move |state: State<Db>, headers: HeaderMap, body: Json<NewUser>| {
                            create(group, state, headers, body)
                        },
                    ),
                )
                .route(
                    &format!("/app/{segment}/{{id}}/"),
                    get(move |state: State<Db>, headers: HeaderMap, id: Path<u64>| {
                        get_one(group, state, headers, id)
                    })
                    .patch(
                        move |state: State<Db>, headers: HeaderMap, id: Path<u64>, body: Json<UserUpdate>| {
                            update(group, state, headers, id, body)
                        },
                    )
                    .delete(move |state: State<Db>, headers: HeaderMap, id: Path<u64>| {
                        delete(group, state, headers, id)
                    }),
                )
        })
}

fn member(store: &Store, group: Group, id: u64) -> Result<&Account, Failure> {
    store
        .accounts
        .get(&id)
        .filter(|account| account.group == group)
        .ok_or_else(Failure::not_found)
}

/// Users may read and change their own record; admins any record.
fn require_self_or_admin(caller: &Account, id: u64) -> Result<(), Failure> {
    if caller.id == id || caller.group == Group::Admin {
        Ok(())
    } else {
        Err(Failure::forbidden())
    }
}

async fn list(group: Group, State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<User>>, Failure> {
    let store = db.read().await;
    require_admin(&caller(&store, &headers)?)?;
    let users = store
        .accounts
        .values()
        .filter(|a| a.group == group)
        .map(Account::user)
        .collect();
    Ok(Json(users))
}

async fn get_one(
    group: Group,
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<User>, Failure> {
    let store = db.read().await;
    let caller = caller(&store, &headers)?;
    let account = member(&store, group, id)?;
    require_self_or_admin(&caller, id)?;
    Ok(Json(account.user()))
}

/// Visitors register themselves; editors and admins are created by admins.
async fn create(
    group: Group,
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), Failure> {
    let mut store = db.write().await;
    if group != Group::Visitor {
        let caller = optional_caller(&store, &headers)?.ok_or_else(Failure::forbidden)?;
        require_admin(&caller)?;
    }
    if input.username.trim().is_empty() {
        return Err(Failure::field("username", "This field may not be blank."));
    }
    if !input.email.contains('@') {
        return Err(Failure::field("email", "Enter a valid email address."));
    }
    if input.password.is_empty() {
        return Err(Failure::field("password", "This field may not be blank."));
    }
    if store.accounts.values().any(|a| a.email.eq_ignore_ascii_case(&input.email)) {
        return Err(Failure::field("email", "user with this email already exists."));
    }

    let id = store.next_id();
    let account = Account {
        id,
        username: input.username,
        email: input.email,
        password: input.password,
        group,
    };
    let user = account.user();
    store.accounts.insert(id, account);
    tracing::info!(user_id = id, rol = group.rol(), "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update(
    group: Group,
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<UserUpdate>,
) -> Result<Json<User>, Failure> {
    let mut store = db.write().await;
    let caller = caller(&store, &headers)?;
    member(&store, group, id)?;
    require_self_or_admin(&caller, id)?;
    if let Some(email) = &input.email {
        if store.accounts.values().any(|a| a.id != id && a.email.eq_ignore_ascii_case(email)) {
            return Err(Failure::field("email", "user with this email already exists."));
        }
    }

    let account = store.accounts.get_mut(&id).ok_or_else(Failure::not_found)?;
    if let Some(username) = input.username {
        account.username = username;
    }
    if let Some(email) = input.email {
        account.email = email;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    Ok(Json(account.user()))
}

async fn delete(
    group: Group,
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    require_admin(&caller(&store, &headers)?)?;
    member(&store, group, id)?;
    store.accounts.remove(&id);
    store.access_tokens.retain(|_, user| *user != id);
    store.refresh_tokens.retain(|_, user| *user != id);
    Ok(StatusCode::NO_CONTENT)
}
