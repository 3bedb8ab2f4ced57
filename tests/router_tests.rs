mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::Method;
use switchyard::router::{handler, Flow, Route, Router};
use switchyard::server::{Request, Response};
use switchyard::{HttpError, RegistrationError};

use common::{raw_request, RecordingWriter};

fn request(method: &str, uri: &str) -> Request {
    Request::new(raw_request(method, uri))
}

fn response() -> (Response, Arc<Mutex<common::WriterState>>) {
    let (writer, state) = RecordingWriter::new();
    (Response::new(Box::new(writer)), state)
}

#[test]
fn test_route_rejects_empty_handler_chain() {
    let err = Route::new(Method::GET, "/x", Vec::new()).unwrap_err();
    assert_eq!(err, RegistrationError::EmptyHandlerChain);
}

#[test]
fn test_router_rejects_empty_route_path() {
    let mut router = Router::new();
    let route = Route::new(Method::GET, "", vec![handler(|_, _| Ok(Flow::Exit))]).unwrap();
    assert_eq!(
        router.add_route(route).unwrap_err(),
        RegistrationError::EmptyRoutePath
    );
    assert_eq!(router.route_count(), 0);
}

#[test]
fn test_first_matching_route_wins() {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    for label in ["two-segment", "one-segment"] {
        let hits = Arc::clone(&hits);
        let pattern = if label == "two-segment" {
            "/stress/:id/:name"
        } else {
            "/stress/:id"
        };
        router
            .add_route(
                Route::new(
                    Method::GET,
                    pattern,
                    vec![handler(move |_, _| {
                        hits.lock().unwrap().push(label);
                        Ok(Flow::Exit)
                    })],
                )
                .unwrap(),
            )
            .unwrap();
    }

    let (res, _) = response();
    let req = request("GET", "/stress/7/foo");
    assert!(router.handle(&req, &res).unwrap());
    assert_eq!(
        req.path_params().as_slice(),
        [
            ("id".to_string(), "7".to_string()),
            ("name".to_string(), "foo".to_string()),
        ]
    );

    let req = request("GET", "/stress/7");
    assert!(router.handle(&req, &res).unwrap());
    assert_eq!(*hits.lock().unwrap(), vec!["two-segment", "one-segment"]);
}

#[test]
fn test_at_most_one_route_handles() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut router = Router::new();
    for _ in 0..3 {
        let calls = Arc::clone(&calls);
        router
            .add_route(
                Route::new(
                    Method::GET,
                    "/same",
                    vec![handler(move |_, _| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(Flow::Exit)
                    })],
                )
                .unwrap(),
            )
            .unwrap();
    }
    let (res, _) = response();
    assert!(router.handle(&request("GET", "/same"), &res).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_params_captured_even_on_method_mismatch() {
    let route = Route::new(Method::GET, "/pets/:id", vec![handler(|_, _| Ok(Flow::Exit))]).unwrap();
    let req = request("POST", "/pets/9");
    assert!(!route.matches(&req));
    assert_eq!(
        req.path_params().as_slice(),
        [("id".to_string(), "9".to_string())]
    );
}

#[test]
fn test_handler_chain_runs_in_order_until_exit() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let step = |n: usize, flow: Flow, order: &Arc<Mutex<Vec<usize>>>| {
        let order = Arc::clone(order);
        handler(move |_, _| {
            order.lock().unwrap().push(n);
            Ok(flow)
        })
    };

    let route = Route::new(
        Method::GET,
        "/chain",
        vec![
            step(1, Flow::Continue, &order),
            step(2, Flow::Exit, &order),
            step(3, Flow::Continue, &order),
        ],
    )
    .unwrap();

    let (res, _) = response();
    let flow = route.handle(&request("GET", "/chain"), &res).unwrap();
    assert_eq!(flow, Flow::Exit);
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_handler_chain_falls_off_end_as_exit() {
    let route = Route::new(
        Method::GET,
        "/chain",
        vec![
            handler(|_, _| Ok(Flow::Continue)),
            handler(|_, _| Ok(Flow::Continue)),
        ],
    )
    .unwrap();
    let (res, _) = response();
    assert_eq!(
        route.handle(&request("GET", "/chain"), &res).unwrap(),
        Flow::Exit
    );
}

#[test]
fn test_handler_chain_stops_on_error_flow() {
    let reached = Arc::new(AtomicUsize::new(0));
    let reached2 = Arc::clone(&reached);
    let route = Route::new(
        Method::GET,
        "/chain",
        vec![
            handler(|_, _| Ok(Flow::Error)),
            handler(move |_, _| {
                reached2.fetch_add(1, Ordering::SeqCst);
                Ok(Flow::Exit)
            }),
        ],
    )
    .unwrap();
    let (res, _) = response();
    assert_eq!(
        route.handle(&request("GET", "/chain"), &res).unwrap(),
        Flow::Error
    );
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[test]
fn test_middleware_runs_as_prefix_until_short_circuit() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let routed = Arc::new(AtomicUsize::new(0));

    let mut router = Router::new();
    for (n, flow) in [(1, Flow::Continue), (2, Flow::Exit), (3, Flow::Continue)] {
        let order = Arc::clone(&order);
        router.use_middleware(handler(move |_, _| {
            order.lock().unwrap().push(n);
            Ok(flow)
        }));
    }
    let routed2 = Arc::clone(&routed);
    router
        .add_route(
            Route::new(
                Method::GET,
                "/anything",
                vec![handler(move |_, _| {
                    routed2.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Exit)
                })],
            )
            .unwrap(),
        )
        .unwrap();

    let (res, _) = response();
    assert!(router.handle(&request("GET", "/anything"), &res).unwrap());
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    assert_eq!(routed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_middleware_error_flow_counts_as_handled() {
    let mut router = Router::new();
    router.use_middleware(handler(|_, _| Ok(Flow::Error)));
    let (res, _) = response();
    assert!(router.handle(&request("GET", "/x"), &res).unwrap());
}

#[test]
fn test_no_match_reports_unhandled() {
    let mut router = Router::new();
    router
        .add_route(Route::new(Method::GET, "/a", vec![handler(|_, _| Ok(Flow::Exit))]).unwrap())
        .unwrap();
    let (res, _) = response();
    assert!(!router.handle(&request("GET", "/b"), &res).unwrap());
    assert!(!router.handle(&request("POST", "/a"), &res).unwrap());
}

#[test]
fn test_handler_http_error_propagates() {
    let mut router = Router::new();
    router
        .add_route(
            Route::new(
                Method::GET,
                "/fail",
                vec![handler(|_, _| {
                    Err(HttpError::with_status("no such pet", 404, "Not Found"))
                })],
            )
            .unwrap(),
        )
        .unwrap();
    let (res, _) = response();
    let err = router.handle(&request("GET", "/fail"), &res).unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.reason(), "Not Found");
    // the router never renders: nothing was sent
    assert!(!res.is_sent());
}

#[test]
fn test_middleware_http_error_propagates() {
    let mut router = Router::new();
    router.use_middleware(handler(|_, _| Err(HttpError::new("middleware blew up"))));
    let (res, _) = response();
    let err = router.handle(&request("GET", "/x"), &res).unwrap_err();
    assert_eq!(err.status(), 500);
}
