use crate::context::{EvaluationContext, ExecutionTimer};
use crate::evaluator::Evaluator;
use crate::hooks::{StatisticsHook, TracingHook};
use crate::results::{
    construct_triples, ConciseBoundedDescription, DescribeAlgorithm, QueryResults,
    TemplateConstructor,
};
use crate::service::ServiceHandler;
use crate::sparql::{QueryExplanation, QueryOptions};
use rdf_eval_common::{Dataset, QueryResult};
use rdf_eval_functions::{DefaultFunctionRegistry, FunctionRegistryRef};
use rdf_eval_logical::optimizer::OptimizerRule;
use rdf_eval_logical::{AlgebraBuilder, AlgebraOptimizer, AlgebraQuery, QueryForm};
use spargebra::Query;
use std::sync::Arc;
use std::time::Instant;

/// Evaluates SPARQL queries against a [Dataset].
///
/// A query is lowered into the algebra, optimized according to the [QueryOptions], and evaluated
/// within a fresh [EvaluationContext]. The evaluator itself is stateless and can be shared between
/// threads. Concurrent queries only share the dataset.
#[derive(Debug, Clone)]
pub struct QueryEvaluator {
    dataset: Arc<dyn Dataset>,
    registry: FunctionRegistryRef,
    service_handler: Option<Arc<dyn ServiceHandler>>,
    describe_algorithm: Arc<dyn DescribeAlgorithm>,
    /// Rules that run before the builtin optimizer rules.
    custom_rules: Vec<Arc<dyn OptimizerRule>>,
}

impl QueryEvaluator {
    /// Creates a new [QueryEvaluator] with the builtin functions and no service handler.
    pub fn new(dataset: Arc<dyn Dataset>) -> Self {
        Self {
            dataset,
            registry: Arc::new(DefaultFunctionRegistry::new()),
            service_handler: None,
            describe_algorithm: Arc::new(ConciseBoundedDescription),
            custom_rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_function_registry(mut self, registry: FunctionRegistryRef) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_service_handler(mut self, handler: Arc<dyn ServiceHandler>) -> Self {
        self.service_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_describe_algorithm(mut self, algorithm: Arc<dyn DescribeAlgorithm>) -> Self {
        self.describe_algorithm = algorithm;
        self
    }

    /// Adds an optimizer rule that runs before the builtin rules, after the previously added
    /// custom rules.
    #[must_use]
    pub fn with_optimizer_rule(mut self, rule: Arc<dyn OptimizerRule>) -> Self {
        self.custom_rules.push(rule);
        self
    }

    pub fn dataset(&self) -> &dyn Dataset {
        self.dataset.as_ref()
    }

    /// Parses and evaluates a SPARQL query.
    pub fn evaluate_str(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> QueryResult<(QueryResults, QueryExplanation)> {
        let query = Query::parse(query, None)?;
        self.evaluate(&query, options)
    }

    /// Evaluates a parsed SPARQL query and returns the results along with execution information.
    pub fn evaluate(
        &self,
        query: &Query,
        options: &QueryOptions,
    ) -> QueryResult<(QueryResults, QueryExplanation)> {
        let planning_start = Instant::now();
        let query = AlgebraBuilder::new().build_query(query)?;
        self.evaluate_algebra(query, options, planning_start)
    }

    /// Evaluates a query that has already been lowered into the algebra.
    pub fn evaluate_algebra_query(
        &self,
        query: AlgebraQuery,
        options: &QueryOptions,
    ) -> QueryResult<(QueryResults, QueryExplanation)> {
        self.evaluate_algebra(query, options, Instant::now())
    }

    fn evaluate_algebra(
        &self,
        query: AlgebraQuery,
        options: &QueryOptions,
        planning_start: Instant,
    ) -> QueryResult<(QueryResults, QueryExplanation)> {
        let AlgebraQuery {
            root,
            form,
            dataset,
            base_iri,
        } = query;

        let optimizer = self.custom_rules.iter().rev().fold(
            AlgebraOptimizer::new(options.optimization_level, options.pattern_weights.clone()),
            |optimizer, rule| optimizer.with_leading_rule(Arc::clone(rule)),
        );
        let initial_plan = root.clone();
        let (optimized_plan, optimizer_report) = optimizer.optimize(root)?;
        let planning_time = planning_start.elapsed();
        tracing::debug!(?planning_time, "Planned query");

        let evaluation_start = Instant::now();
        let mut tracing_hook = TracingHook;
        let mut statistics_hook = StatisticsHook::new();
        let results = {
            let timer = ExecutionTimer::start(options.timeout, options.timeout_check_interval);
            let context = EvaluationContext::try_new(
                self.dataset.as_ref(),
                dataset.as_ref(),
                options.default_graph_as_union,
                timer,
            )?;

            let mut evaluator = Evaluator::new(context, Arc::clone(&self.registry))
                .with_base_iri(base_iri)
                .with_hook(&mut tracing_hook);
            if options.collect_statistics {
                evaluator = evaluator.with_hook(&mut statistics_hook);
            }
            if let Some(handler) = &self.service_handler {
                evaluator = evaluator.with_service_handler(Arc::clone(handler));
            }

            let solutions = evaluator.evaluate_node(&optimized_plan, None)?;
            let results = match form {
                QueryForm::Select => QueryResults::Solutions(solutions),
                QueryForm::Ask => QueryResults::Boolean(!solutions.is_empty()),
                QueryForm::Construct { template } => QueryResults::Graph(construct_triples(
                    &TemplateConstructor::new(template),
                    &solutions,
                )),
                QueryForm::Describe => QueryResults::Graph(
                    self.describe_algorithm
                        .describe(evaluator.context(), &solutions)?,
                ),
            };
            evaluator.context().check_timeout()?;
            results
        };
        let evaluation_time = evaluation_start.elapsed();
        tracing::debug!(?evaluation_time, results = results.len(), "Evaluated query");

        let statistics = options
            .collect_statistics
            .then(|| statistics_hook.collect(&optimized_plan));
        let explanation = QueryExplanation {
            planning_time,
            evaluation_time,
            initial_plan,
            optimized_plan,
            optimizer_report,
            statistics,
        };
        Ok((results, explanation))
    }
}
